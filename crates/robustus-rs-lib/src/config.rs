//! Environment settings.
//!
//! Stored as JSON in the `.robustus` file at the root of every environment.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

/// Name of the settings file inside an environment.
pub const SETTINGS_FILE: &str = ".robustus";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("invalid setting: {0}")]
	Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Wheel cache directory, relative paths are resolved against the environment.
	cache: PathBuf,
	/// Extra locations to look for packages in, passed on to pip.
	find_links: Vec<String>,
	/// How much of what is run gets echoed, see [`Config::log_level`].
	verbosity: u8,
	/// Keep build directories of failed installs for inspection.
	debug: bool,
	/// Reinstall editable requirements even when their checkout already exists.
	update_editables: bool,
	/// Packages that may be installed several times side by side, see [`DuplicatePolicy`](crate::dedup::DuplicatePolicy).
	multi_instance_packages: Vec<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			cache: PathBuf::from("wheelhouse"),
			find_links: Vec::new(),
			verbosity: 0,
			debug: false,
			update_editables: false,
			multi_instance_packages: vec!["ros_overlay".to_string()],
		}
	}
}

/// Settings given on the command line, applied over the ones loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
	pub cache: Option<PathBuf>,
	pub find_links: Vec<String>,
	pub verbosity: Option<u8>,
	pub debug: bool,
	pub update_editables: bool,
}

impl Config {
	/// Loads and validates the settings file at `path`.
	///
	/// # Errors
	/// - [`IO`](ConfigError::IO) when the file can't be read.
	/// - [`SerdeJSON`](ConfigError::SerdeJSON) when it isn't valid JSON or has unknown keys.
	/// - [`Validation`](ConfigError::Validation) when a value is out of range.
	pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		log::debug!("Loading settings from {}", path.display());
		let file = std::fs::File::open(path)?;
		let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
		config.validate()?;
		Ok(config)
	}

	pub fn save_to_disk(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let file = std::fs::File::create(path)?;
		serde_json::to_writer_pretty(file, self)?;
		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.cache.as_os_str().is_empty() {
			return Err(ConfigError::Validation("cache directory is empty".to_string()));
		}

		for link in &self.find_links {
			if url::Url::parse(link).is_err() && !Path::new(link).is_absolute() {
				return Err(ConfigError::Validation(format!("find link \"{}\" is neither a URL nor an absolute path", link)));
			}
		}

		for name in &self.multi_instance_packages {
			if !crate::requirement::is_valid_name(name) {
				return Err(ConfigError::Validation(format!("\"{}\" is not a valid package name", name)));
			}
		}

		Ok(())
	}

	pub fn apply(&mut self, overrides: &ConfigOverrides) {
		if let Some(cache) = &overrides.cache {
			self.cache = cache.clone();
		}
		self.find_links.extend(overrides.find_links.iter().cloned());
		if let Some(verbosity) = overrides.verbosity {
			self.verbosity = verbosity;
		}
		self.debug |= overrides.debug;
		self.update_editables |= overrides.update_editables;
	}

	pub fn cache(&self) -> &Path {
		&self.cache
	}
	pub fn set_cache(&mut self, cache: PathBuf) {
		self.cache = cache;
	}

	pub fn find_links(&self) -> &[String] {
		&self.find_links
	}

	pub fn verbosity(&self) -> u8 {
		self.verbosity
	}

	pub fn debug(&self) -> bool {
		self.debug
	}

	/// Default log filter: `debug` or one `-v` shows debug output, two or more show everything.
	pub fn log_level(&self) -> log::LevelFilter {
		match (self.verbosity, self.debug) {
			(v, _) if v >= 2 => log::LevelFilter::Trace,
			(1, _) | (_, true) => log::LevelFilter::Debug,
			_ => log::LevelFilter::Info,
		}
	}

	pub fn update_editables(&self) -> bool {
		self.update_editables
	}
	pub fn set_update_editables(&mut self, update_editables: bool) {
		self.update_editables = update_editables;
	}

	pub fn multi_instance_packages(&self) -> &[String] {
		&self.multi_instance_packages
	}

	pub fn duplicate_policy(&self) -> crate::dedup::DuplicatePolicy {
		crate::dedup::DuplicatePolicy::new(self.multi_instance_packages.iter().cloned())
	}
}
