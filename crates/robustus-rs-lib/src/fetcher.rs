//! Retrieves single files from remote repositories.
//!
//! The expander only needs the text of a nested `requirements.txt`, how it is retrieved,
//! retried or timed out is up to the [`SourceFetcher`] implementation.

use std::path::{Path, PathBuf};

mod git;
pub use git::GitFetcher;

/// Errors that can occur while fetching a file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
	/// The requested branch or tag doesn't exist in the repository.
	#[error("revision `{revision}` not found in {repository}")]
	RevisionNotFound { repository: String, revision: String },
	/// The checkout succeeded but doesn't contain the file.
	#[error("{} not found in {repository}", file.display())]
	FileNotFound { repository: String, file: PathBuf },
	#[error("`{command}` failed with {status}: {stderr}")]
	Command { command: String, status: std::process::ExitStatus, stderr: String },
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// Source of files stored in version control.
pub trait SourceFetcher {
	/// Returns the lines of `file` in `repository` at `revision`.
	///
	/// `revision` of `None` means the default branch. When the revision doesn't exist
	/// implementations fail with [`FetchError::RevisionNotFound`] unless `ignore_missing_revision`
	/// is set, in which case they may fall back to the default branch.
	fn fetch(&self, repository: &str, revision: Option<&str>, file: &Path, ignore_missing_revision: bool) -> Result<Vec<String>, FetchError>;
}
