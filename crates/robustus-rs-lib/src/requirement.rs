//! Structured requirements and their pip-style rendering.
//!
//! A [`Requirement`] is either named (`numpy==1.7.2`), URL based (`http://host/pkg.tar.gz`)
//! or path based (`/src/pkg`). URL requirements may also carry a name extracted from
//! an `#egg=` fragment. [`RequirementSpecifier`] wraps a requirement with the
//! resolution metadata only available when parsing text.

use std::path::{Path, PathBuf};

use url::Url;

mod specifier;
pub use specifier::RequirementSpecifier;
pub(crate) use specifier::is_valid_name;

mod vcs;
pub use vcs::GitSource;

/// Errors raised while turning specifier text into an expanded requirement list.
#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
	/// The text does not follow the specifier grammar. Holds the offending literal.
	#[error("invalid requirement specified \"{0}\"")]
	InvalidSpecifier(String),
	/// An expandable requirement has no `requirements.txt` to read.
	#[error("requirement \"{0}\" has no requirements.txt to expand")]
	MissingManifest(String),
	#[error("failed to read {}: {source}", path.display())]
	Read { path: PathBuf, source: std::io::Error },
	#[error(transparent)]
	Fetch(#[from] crate::fetcher::FetchError),
	/// A failure inside the manifest of another requirement.
	#[error("in requirements of \"{manifest}\": {source}")]
	InManifest { manifest: String, source: Box<RequirementError> },
}

/// Where the package content of a requirement comes from, when it isn't an index lookup by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
	Url(Url),
	/// Absolute path to an already checked out source tree.
	Path(PathBuf),
}

/// An installable unit.
///
/// Every requirement has a name, a location or both. The constructors enforce this,
/// there is no way to build a requirement with neither.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
	name: Option<String>,
	/// Opaque, may be a release number, a commit hash or a full distribution string.
	version: Option<String>,
	location: Option<Location>,
	editable: bool,
}

impl Requirement {
	/// Callers check `name` with [`is_valid_name`] first.
	pub(crate) fn named(name: impl Into<String>, version: Option<String>) -> Self {
		Self {
			name: Some(name.into()),
			version,
			location: None,
			editable: false,
		}
	}

	/// `name` is usually the egg name found in the URL fragment.
	pub fn from_url(url: Url, name: Option<String>) -> Self {
		Self {
			name,
			version: None,
			location: Some(Location::Url(url)),
			editable: false,
		}
	}

	pub fn from_path(path: impl Into<PathBuf>) -> Self {
		Self {
			name: None,
			version: None,
			location: Some(Location::Path(path.into())),
			editable: false,
		}
	}

	/// Reads the name and version back out of a cache record filename.
	///
	/// `numpy__1_7_2.rob` gives `numpy==1.7.2`, `scipy.rob` gives `scipy`.
	/// Returns `None` when the file is not a `.rob` record or the name isn't a package name.
	pub fn from_rob_filename(path: impl AsRef<Path>) -> Option<Self> {
		let file_name = path.as_ref().file_name()?.to_str()?;
		let stem = file_name.strip_suffix(".rob")?;
		let (name, version) = match stem.split_once("__") {
			Some((name, version)) => (name, Some(version.replace('_', "."))),
			None => (stem, None),
		};
		is_valid_name(name).then(|| Self::named(name, version))
	}

	pub fn editable(mut self, editable: bool) -> Self {
		self.editable = editable;
		self
	}

	/* Fields */

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn version(&self) -> Option<&str> {
		self.version.as_deref()
	}

	pub fn location(&self) -> Option<&Location> {
		self.location.as_ref()
	}

	pub fn url(&self) -> Option<&Url> {
		match &self.location {
			Some(Location::Url(url)) => Some(url),
			_ => None,
		}
	}

	pub fn path(&self) -> Option<&Path> {
		match &self.location {
			Some(Location::Path(path)) => Some(path),
			_ => None,
		}
	}

	pub fn is_editable(&self) -> bool {
		self.editable
	}

	/// The git repository and revision behind a `git+` URL.
	pub fn git_source(&self) -> Option<GitSource> {
		self.url().and_then(GitSource::from_url)
	}

	/// The key used to decide whether two requirements refer to the same package.
	///
	/// The name when there is one, otherwise the path or URL text.
	pub fn base_name(&self) -> String {
		match (&self.name, &self.location) {
			(Some(name), _) => name.clone(),
			(None, Some(Location::Path(path))) => path.display().to_string(),
			(None, Some(Location::Url(url))) => url.to_string(),
			(None, None) => unreachable!("requirement constructed without a name or location"),
		}
	}

	/// Renders the requirement the way pip accepts it, including the editable flag.
	pub fn freeze(&self) -> String {
		if self.editable {
			format!("-e {}", self.freeze_base())
		} else {
			self.freeze_base()
		}
	}

	/// Renders the requirement without flags.
	pub fn freeze_base(&self) -> String {
		match (&self.location, &self.name) {
			(Some(Location::Url(url)), name) => render_url(url, name.as_deref()),
			(Some(Location::Path(path)), _) => path.display().to_string(),
			(None, Some(name)) => match &self.version {
				Some(version) => format!("{}=={}", name, version),
				None => name.clone(),
			},
			(None, None) => unreachable!("requirement constructed without a name or location"),
		}
	}

	/// Name of the file recording this package in the wheel cache.
	///
	/// Dots in the version are replaced by underscores: `numpy__1_7_2.rob`.
	/* TODO: URL and path requirements have no cache record yet */
	pub fn rob_filename(&self) -> Option<String> {
		let name = self.name.as_ref()?;
		Some(match &self.version {
			Some(version) => format!("{}__{}.rob", name, version.replace('.', "_")),
			None => format!("{}.rob", name),
		})
	}

	/// Points an editable git requirement at another branch or tag.
	///
	/// Returns `false` and leaves the requirement untouched when it is not an editable `git+` URL.
	pub fn override_branch(&mut self, tag: &str) -> bool {
		if !self.editable {
			return false;
		}
		match &mut self.location {
			Some(Location::Url(url)) if GitSource::is_git_url(url) => {
				let path = match url.path().rsplit_once('@') {
					Some((base, _)) => format!("{}@{}", base, tag),
					None => format!("{}@{}", url.path(), tag),
				};
				url.set_path(&path);
				true
			},
			_ => false,
		}
	}
}

impl std::fmt::Display for Requirement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.freeze())
	}
}

/// Puts the egg name back into the fragment so pip can tell what the URL installs.
fn render_url(url: &Url, name: Option<&str>) -> String {
	let Some(name) = name else {
		return url.to_string();
	};
	let mut url = url.clone();
	let fragment = match url.fragment() {
		Some(existing) if !existing.is_empty() => format!("egg={}&{}", name, existing),
		_ => format!("egg={}", name),
	};
	url.set_fragment(Some(&fragment));
	url.to_string()
}

#[cfg(test)]
mod test {
	use super::*;

	fn url(s: &str) -> Url { Url::parse(s).unwrap() }

	#[test] fn freeze_named() { assert_eq!(Requirement::named("numpy", Some("1.7.2".into())).freeze(), "numpy==1.7.2") }
	#[test] fn freeze_named_editable() { assert_eq!(Requirement::named("numpy", Some("1.7.2".into())).editable(true).freeze(), "-e numpy==1.7.2") }
	#[test] fn freeze_unversioned() { assert_eq!(Requirement::named("scipy", None).freeze(), "scipy") }
	#[test] fn freeze_url() { assert_eq!(Requirement::from_url(url("http://requirement.org/requirement.zip"), None).freeze(), "http://requirement.org/requirement.zip") }
	#[test] fn freeze_url_editable() { assert_eq!(Requirement::from_url(url("http://requirement.org/requirement.zip"), None).editable(true).freeze(), "-e http://requirement.org/requirement.zip") }
	#[test] fn freeze_url_with_egg() { assert_eq!(Requirement::from_url(url("git+https://host/org/pkg@dev"), Some("pkg".into())).editable(true).freeze(), "-e git+https://host/org/pkg@dev#egg=pkg") }
	#[test] fn freeze_path() { assert_eq!(Requirement::from_path("/src/pkg").freeze_base(), "/src/pkg") }

	#[test] fn base_name_prefers_name() { assert_eq!(Requirement::from_url(url("git+https://host/org/pkg"), Some("pkg".into())).base_name(), "pkg") }
	#[test] fn base_name_falls_back_to_path() { assert_eq!(Requirement::from_path("/src/pkg").base_name(), "/src/pkg") }
	#[test] fn base_name_falls_back_to_url() { assert_eq!(Requirement::from_url(url("http://host/pkg.tar.gz"), None).base_name(), "http://host/pkg.tar.gz") }

	#[test] fn rob_filename_versioned() { assert_eq!(Requirement::named("numpy", Some("1.7.2".into())).rob_filename().as_deref(), Some("numpy__1_7_2.rob")) }
	#[test] fn rob_filename_unversioned() { assert_eq!(Requirement::named("scipy", None).rob_filename().as_deref(), Some("scipy.rob")) }
	#[test] fn rob_filename_nameless() { assert_eq!(Requirement::from_path("/src/pkg").rob_filename(), None) }
	#[test] fn from_rob_versioned() { assert_eq!(Requirement::from_rob_filename("/cache/numpy__1_7_2.rob"), Some(Requirement::named("numpy", Some("1.7.2".into())))) }
	#[test] fn from_rob_invalid_name() { assert_eq!(Requirement::from_rob_filename("a b.rob"), None) }
	#[test] fn from_rob_empty_name() { assert_eq!(Requirement::from_rob_filename("__1_0.rob"), None) }
	#[test] fn from_rob_unversioned() { assert_eq!(Requirement::from_rob_filename("scipy.rob"), Some(Requirement::named("scipy", None))) }
	#[test] fn from_rob_wrong_extension() { assert_eq!(Requirement::from_rob_filename("scipy.whl"), None) }

	#[test]
	fn override_branch_replaces_revision() {
		let mut r = Requirement::from_url(url("git+https://host/org/pkg@master"), Some("pkg".into())).editable(true);
		assert!(r.override_branch("v2"));
		assert_eq!(r.freeze(), "-e git+https://host/org/pkg@v2#egg=pkg");
	}

	#[test]
	fn override_branch_appends_revision() {
		let mut r = Requirement::from_url(url("git+ssh://git@host/org/pkg"), Some("pkg".into())).editable(true);
		assert!(r.override_branch("v2"));
		assert_eq!(r.freeze_base(), "git+ssh://git@host/org/pkg@v2#egg=pkg");
	}

	#[test]
	fn override_branch_ignores_non_editable() {
		let mut r = Requirement::from_url(url("git+https://host/org/pkg@master"), Some("pkg".into()));
		assert!(!r.override_branch("v2"));
		assert_eq!(r.freeze_base(), "git+https://host/org/pkg@master#egg=pkg");
	}

	#[test]
	fn override_branch_ignores_plain_urls() {
		let mut r = Requirement::from_url(url("http://host/pkg.tar.gz"), None).editable(true);
		assert!(!r.override_branch("v2"));
	}
}
