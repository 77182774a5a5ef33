//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use robustus_rs::fetcher::{FetchError, SourceFetcher};

#[derive(Debug, thiserror::Error)]
pub enum TestUtilError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// A repository and revision pair, `None` being the default branch.
pub type Checkout = (String, Option<String>);

/// In-memory [`SourceFetcher`] that records every request it receives.
#[derive(Debug, Default)]
pub struct FakeFetcher {
	manifests: HashMap<Checkout, Vec<String>>,
	/// Checkouts that exist but contain no manifest.
	empty: HashSet<Checkout>,
	calls: RefCell<Vec<Checkout>>,
}

impl FakeFetcher {
	/// Serves `lines` as the manifest of `repository` at `revision`.
	pub fn with_manifest(mut self, repository: &str, revision: Option<&str>, lines: &[&str]) -> Self {
		self.manifests.insert(
			(repository.to_string(), revision.map(str::to_string)),
			lines.iter().map(|l| l.to_string()).collect(),
		);
		self
	}

	/// Makes `repository` at `revision` exist without a manifest.
	pub fn with_checkout(mut self, repository: &str, revision: Option<&str>) -> Self {
		self.empty.insert((repository.to_string(), revision.map(str::to_string)));
		self
	}

	pub fn calls(&self) -> Vec<Checkout> {
		self.calls.borrow().clone()
	}

	/// How many times `repository` was requested, at any revision.
	pub fn fetch_count(&self, repository: &str) -> usize {
		self.calls.borrow().iter().filter(|(r, _)| r == repository).count()
	}

	fn revision_exists(&self, key: &Checkout) -> bool {
		self.manifests.contains_key(key) || self.empty.contains(key)
	}
}

impl SourceFetcher for FakeFetcher {
	fn fetch(&self, repository: &str, revision: Option<&str>, file: &Path, ignore_missing_revision: bool) -> Result<Vec<String>, FetchError> {
		let mut key = (repository.to_string(), revision.map(str::to_string));
		self.calls.borrow_mut().push(key.clone());

		if let (false, Some(revision)) = (self.revision_exists(&key), revision) {
			if !ignore_missing_revision {
				return Err(FetchError::RevisionNotFound { repository: repository.to_string(), revision: revision.to_string() });
			}
			key.1 = None;
		}

		self.manifests.get(&key).cloned().ok_or_else(|| FetchError::FileNotFound {
			repository: repository.to_string(),
			file: file.to_path_buf(),
		})
	}
}

/// Writes `lines` as `requirements.txt` inside `dir`, creating it if needed.
pub fn write_manifest(dir: impl AsRef<Path>, lines: &[&str]) -> Result<PathBuf, TestUtilError> {
	let dir = dir.as_ref();
	std::fs::create_dir_all(dir)?;
	let path = dir.join(robustus_rs::expander::MANIFEST_FILE);
	std::fs::write(&path, lines.join("\n"))?;
	Ok(path)
}

/// Lays out the files [`robustus_rs::Environment::open`] expects inside `dir`.
///
/// The python and pip executables are empty placeholders, nothing can actually be installed.
pub fn create_environment(dir: impl AsRef<Path>, settings: &str) -> Result<(), TestUtilError> {
	let dir = dir.as_ref();
	std::fs::create_dir_all(dir.join("bin"))?;
	std::fs::write(dir.join("bin").join("python"), "")?;
	std::fs::write(dir.join("bin").join("pip"), "")?;
	std::fs::write(dir.join(robustus_rs::config::SETTINGS_FILE), settings)?;
	Ok(())
}

/// [`create_environment`] inside a fresh temporary directory, removed when the returned handle drops.
pub fn temp_environment(settings: &str) -> Result<tempfile::TempDir, TestUtilError> {
	let dir = tempfile::Builder::new().prefix("robustus-env-").tempdir()?;
	create_environment(dir.path(), settings)?;
	Ok(dir)
}

/// Frozen text of every requirement, for comparing plans.
pub fn frozen(plan: &[robustus_rs::RequirementSpecifier]) -> Vec<String> {
	plan.iter().map(|r| r.freeze()).collect()
}
