//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("config error: {0}")]
	Config(#[from] crate::config::ConfigError),
	#[error("requirement error: {0}")]
	Requirement(#[from] crate::requirement::RequirementError),
	#[error("fetch error: {0}")]
	Fetch(#[from] crate::fetcher::FetchError),
	#[error("install error: {0}")]
	Install(#[from] crate::installer::InstallError),
	#[error("bad environment {path}: {reason}")]
	BadEnvironment { path: std::path::PathBuf, reason: String },
	#[error("no requirements given to install")]
	NoRequirements,
}
