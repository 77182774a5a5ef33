//! [`SourceFetcher`] backed by the `git` executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{FetchError, SourceFetcher};

/// Shallow clones the repository into a temporary directory and reads the file from it.
///
/// The checkout is removed when the fetch returns, successful or not.
///
/// Revisions are branch or tag names, looked up with `git ls-remote`. A commit hash never
/// matches a ref so it is reported as missing.
#[derive(Debug, Clone)]
pub struct GitFetcher {
	executable: PathBuf,
	/// Where temporary checkouts go, the system temporary directory when `None`.
	checkout_root: Option<PathBuf>,
}

impl Default for GitFetcher {
	fn default() -> Self {
		Self::new("git")
	}
}

impl GitFetcher {
	pub fn new(executable: impl Into<PathBuf>) -> Self {
		Self {
			executable: executable.into(),
			checkout_root: None,
		}
	}

	pub fn checkout_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.checkout_root = Some(root.into());
		self
	}

	fn run<I, S>(&self, args: I) -> Result<Output, FetchError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<OsStr>,
	{
		let mut command = Command::new(&self.executable);
		command.args(args);
		log::debug!("Running {:?}", command);
		Ok(command.output()?)
	}

	/// `git ls-remote --exit-code` exits with 2 when no ref matches.
	fn revision_exists(&self, repository: &str, revision: &str) -> Result<bool, FetchError> {
		let output = self.run(["ls-remote", "--exit-code", repository, revision])?;
		match output.status.code() {
			Some(0) => Ok(true),
			Some(2) => Ok(false),
			_ => Err(command_error(format!("git ls-remote {} {}", repository, revision), output)),
		}
	}

	fn clone_shallow(&self, repository: &str, revision: Option<&str>, destination: &Path) -> Result<(), FetchError> {
		let mut args: Vec<&OsStr> = vec![OsStr::new("clone"), OsStr::new("--depth"), OsStr::new("1")];
		if let Some(revision) = revision {
			args.push(OsStr::new("-b"));
			args.push(OsStr::new(revision));
		}
		args.push(OsStr::new(repository));
		args.push(destination.as_os_str());

		let output = self.run(args)?;
		if output.status.success() {
			Ok(())
		} else {
			Err(command_error(format!("git clone {}", repository), output))
		}
	}
}

impl SourceFetcher for GitFetcher {
	fn fetch(&self, repository: &str, revision: Option<&str>, file: &Path, ignore_missing_revision: bool) -> Result<Vec<String>, FetchError> {
		let revision = match revision {
			Some(rev) if !self.revision_exists(repository, rev)? => {
				if looks_like_commit(rev) {
					log::warn!("{} looks like a commit hash, only branches and tags can be fetched from {}", rev, repository);
				}
				if !ignore_missing_revision {
					return Err(FetchError::RevisionNotFound { repository: repository.to_owned(), revision: rev.to_owned() });
				}
				log::warn!("Revision {} not found in {}, using the default branch.", rev, repository);
				None
			},
			rev => rev,
		};

		let mut builder = tempfile::Builder::new();
		builder.prefix("robustus-checkout-");
		let checkout = match &self.checkout_root {
			Some(root) => builder.tempdir_in(root)?,
			None => builder.tempdir()?,
		};
		log::info!("Cloning {} at {} into {}", repository, revision.unwrap_or("default branch"), checkout.path().display());
		self.clone_shallow(repository, revision, checkout.path())?;

		let content = match std::fs::read_to_string(checkout.path().join(file)) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(FetchError::FileNotFound { repository: repository.to_owned(), file: file.to_path_buf() })
			},
			Err(e) => return Err(e.into()),
		};

		Ok(content.lines().map(str::to_owned).collect())
	}
}

/// Abbreviated or full hexadecimal object name.
fn looks_like_commit(revision: &str) -> bool {
	(7..=40).contains(&revision.len()) && revision.chars().all(|c| c.is_ascii_hexdigit())
}

fn command_error(command: String, output: Output) -> FetchError {
	FetchError::Command {
		command,
		status: output.status,
		stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
	}
}
