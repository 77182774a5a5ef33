//! Recursive expansion of requirements into an installation plan.
//!
//! Editable requirements pointing at a git repository or a local checkout may carry
//! a `requirements.txt` of their own. Expanding a list of specifiers reads those nested
//! manifests, expands their lines the same way, and places every expandable requirement
//! *after* its own dependencies so that installing the plan in order never installs a
//! package before what it needs.
//!
//! # Usage
//! ```no_run
//! use robustus_rs::fetcher::GitFetcher;
//! use robustus_rs::Expander;
//!
//! let fetcher = GitFetcher::default();
//! let plan = Expander::new(&fetcher)
//! 	.tag(Some("release-1.2".to_string()))
//! 	.ignore_missing_refs(true)
//! 	.expand(["-e git+https://github.com/org/app@master#egg=app"])?;
//! for requirement in plan {
//! 	println!("{}", requirement.freeze());
//! }
//! # Ok::<(), robustus_rs::RequirementError>(())
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dedup::DuplicatePolicy;
use crate::fetcher::{FetchError, SourceFetcher};
use crate::requirement::{GitSource, Location};
use crate::{manifest, RequirementError, RequirementSpecifier};

mod visited_sites;
pub use visited_sites::VisitedSites;

/// Name of the nested manifest looked for in expandable requirements.
pub const MANIFEST_FILE: &str = "requirements.txt";

/// Where the nested manifest of an expandable requirement lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Site {
	Git(GitSource),
	Local(PathBuf),
}

impl Site {
	/// `None` when the requirement is a leaf: not editable, not URL or path based, or a non-git URL.
	fn of(requirement: &RequirementSpecifier) -> Option<Site> {
		if !requirement.is_editable() {
			return None;
		}
		match requirement.location()? {
			Location::Url(url) => GitSource::from_url(url).map(Site::Git),
			Location::Path(path) => Some(Site::Local(path.clone())),
		}
	}
}

pub struct Expander<'f> {
	fetcher: &'f dyn SourceFetcher,
	tag: Option<String>,
	ignore_missing_refs: bool,
	policy: DuplicatePolicy,
}

impl<'f> Expander<'f> {
	pub fn new(fetcher: &'f dyn SourceFetcher) -> Self {
		Self {
			fetcher,
			tag: None,
			ignore_missing_refs: false,
			policy: Default::default(),
		}
	}

	/// Branch or tag every editable git requirement is switched to before it is fetched.
	pub fn tag(mut self, tag: Option<String>) -> Self {
		self.tag = tag;
		self
	}

	/// Fall back to the default branch when a requested revision doesn't exist.
	pub fn ignore_missing_refs(mut self, ignore: bool) -> Self {
		self.ignore_missing_refs = ignore;
		self
	}

	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Expands specifier lines into a deduplicated plan with dependencies before dependents.
	///
	/// # Errors
	/// Any parse, fetch or read failure aborts the whole expansion.
	/// Failures inside nested manifests are wrapped in [`RequirementError::InManifest`].
	pub fn expand<I, S>(&self, lines: I) -> Result<Vec<RequirementSpecifier>, RequirementError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut sites = VisitedSites::default();
		let plan = self.expand_lines(lines, &mut sites)?;
		log::debug!("Expanded into {} requirements using {} manifests", plan.len(), sites.len());
		Ok(plan)
	}

	/// Reads a local requirements file and expands it.
	pub fn expand_file(&self, path: impl AsRef<Path>) -> Result<Vec<RequirementSpecifier>, RequirementError> {
		let path = path.as_ref();
		log::info!("Reading requirements from {}", path.display());
		let lines = manifest::read_lines(path).map_err(|source| RequirementError::Read { path: path.to_path_buf(), source })?;
		self.expand(lines)
	}

	/// Builds the full plan for an install: command line specifiers first, then each requirements file.
	///
	/// # Errors
	/// [`Error::NoRequirements`](crate::Error::NoRequirements) when nothing at all was requested.
	pub fn expand_all(&self, specifiers: &[String], requirement_files: &[PathBuf]) -> crate::Result<Vec<RequirementSpecifier>> {
		let mut plan = self.expand(specifiers)?;
		for file in requirement_files {
			plan.extend(self.expand_file(file)?);
		}

		if plan.is_empty() {
			return Err(crate::Error::NoRequirements);
		}

		Ok(self.policy.remove_duplicates(plan))
	}

	fn expand_lines<I, S>(&self, lines: I, sites: &mut VisitedSites) -> Result<Vec<RequirementSpecifier>, RequirementError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let specifiers = manifest::logical_lines(lines)
			.iter()
			.map(|line| {
				log::trace!("Parsing \"{}\"", line);
				RequirementSpecifier::parse(line)
			})
			.collect::<Result<Vec<_>, _>>()?;

		let mut seen = HashSet::<String>::new();
		let mut expanded = Vec::<RequirementSpecifier>::new();

		for mut specifier in specifiers {
			if let Some(tag) = &self.tag {
				if specifier.override_branch(tag) {
					log::debug!("Overriding branch of {} with {}", specifier.base_name(), tag);
				}
			}

			if !seen.insert(specifier.freeze()) {
				log::debug!("Skipping repeated {}", specifier);
				continue;
			}

			expanded.extend(self.expand_specifier(specifier, sites)?);
			expanded = self.policy.remove_duplicates(expanded);
		}

		Ok(expanded)
	}

	/// Emits the dependencies of `specifier` followed by `specifier` itself.
	fn expand_specifier(&self, specifier: RequirementSpecifier, sites: &mut VisitedSites) -> Result<Vec<RequirementSpecifier>, RequirementError> {
		let Some(site) = Site::of(&specifier) else {
			return Ok(vec![specifier]);
		};

		let pinned = specifier.freeze();
		if !sites.enter(&pinned) {
			/* Already being expanded further up, it will be emitted there after its dependencies. */
			log::debug!("{} depends on itself, not expanding it again", pinned);
			return Ok(vec![]);
		}

		let result = sites
			.get_or_fetch(&pinned, || self.fetch_manifest(&site, &pinned))
			.and_then(|manifest| {
				self.expand_lines(manifest, sites).map_err(|e| RequirementError::InManifest {
					manifest: pinned.clone(),
					source: Box::new(e),
				})
			});
		sites.leave(&pinned);

		let mut expanded = result?;
		expanded.push(specifier);
		Ok(expanded)
	}

	fn fetch_manifest(&self, site: &Site, pinned: &str) -> Result<Vec<String>, RequirementError> {
		match site {
			Site::Git(source) => {
				log::info!("Fetching {} of {}", MANIFEST_FILE, source);
				let file = Path::new(MANIFEST_FILE);
				let result = match self.fetcher.fetch(&source.repository, source.revision.as_deref(), file, self.ignore_missing_refs) {
					Err(FetchError::RevisionNotFound { repository, revision }) if self.ignore_missing_refs => {
						log::warn!("Revision {} not found in {}, using the default branch.", revision, repository);
						self.fetcher.fetch(&repository, None, file, false)
					},
					other => other,
				};
				result.map_err(|e| match e {
					FetchError::FileNotFound { .. } => RequirementError::MissingManifest(pinned.to_owned()),
					e => e.into(),
				})
			},
			Site::Local(path) => {
				let manifest = path.join(MANIFEST_FILE);
				log::info!("Reading {}", manifest.display());
				match manifest::read_lines(&manifest) {
					Ok(lines) => Ok(lines),
					Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RequirementError::MissingManifest(pinned.to_owned())),
					Err(source) => Err(RequirementError::Read { path: manifest, source }),
				}
			},
		}
	}
}

/// Reads and expands a local requirements file with the default duplicate policy.
pub fn read_requirement_file(path: impl AsRef<Path>, tag: Option<String>, ignore_missing_refs: bool, fetcher: &dyn SourceFetcher) -> Result<Vec<RequirementSpecifier>, RequirementError> {
	Expander::new(fetcher)
		.tag(tag)
		.ignore_missing_refs(ignore_missing_refs)
		.expand_file(path)
}
