//! An existing python environment managed by robustus.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigOverrides, SETTINGS_FILE};
use crate::{Requirement, RequirementSpecifier};

/// A virtualenv with a `.robustus` settings file and a wheel cache.
#[derive(Debug)]
pub struct Environment {
	path: PathBuf,
	config: Config,
	python: PathBuf,
	pip: PathBuf,
	/// Packages read from cache records in file name order, followed by the ones installed since opening.
	cached_packages: Vec<Requirement>,
}

impl Environment {
	/// Opens the environment at `path`, applying `overrides` to its stored settings.
	///
	/// Creates the cache directory when it doesn't exist yet.
	///
	/// # Errors
	/// - [`Error::BadEnvironment`](crate::Error::BadEnvironment) when the settings file or the python or pip executables are missing.
	/// - [`Error::Config`](crate::Error::Config) when the settings can't be loaded.
	pub fn open(path: impl AsRef<Path>, overrides: &ConfigOverrides) -> crate::Result<Environment> {
		let path = std::path::absolute(path.as_ref())?;
		let bad = |reason: &str| crate::Error::BadEnvironment { path: path.clone(), reason: reason.to_string() };

		let settings = path.join(SETTINGS_FILE);
		if !settings.is_file() {
			return Err(bad("not a robustus environment, settings file is missing"));
		}

		let bin = path.join("bin");
		let python = ["python", "python27"]
			.iter()
			.map(|name| bin.join(name))
			.find(|p| p.exists())
			.ok_or_else(|| bad("python executable is missing"))?;
		let pip = bin.join("pip");
		if !pip.exists() {
			return Err(bad("pip executable is missing"));
		}

		let mut config = Config::load_from_disk(&settings)?;
		config.apply(overrides);
		config.validate()?;

		let mut env = Environment {
			path,
			config,
			python,
			pip,
			cached_packages: Vec::new(),
		};

		let cache = env.cache_dir();
		if !cache.exists() {
			log::info!("Creating cache directory {}", cache.display());
			std::fs::create_dir_all(&cache)?;
		}
		env.cached_packages = read_cached_packages(&cache)?;

		log::info!("Opened environment at {} with {} cached packages", env.path.display(), env.cached_packages.len());
		Ok(env)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn python(&self) -> &Path {
		&self.python
	}

	pub fn pip(&self) -> &Path {
		&self.pip
	}

	/// The wheel cache, resolved against the environment root.
	pub fn cache_dir(&self) -> PathBuf {
		self.path.join(self.config.cache())
	}

	/// Where pip checks out an editable requirement named `name`.
	pub fn editable_checkout_dir(&self, name: &str) -> PathBuf {
		self.path.join("src").join(name)
	}

	/* Cache */

	pub fn cached_packages(&self) -> &[Requirement] {
		&self.cached_packages
	}

	/// The first cached package `specifier` accepts.
	pub fn find_satisfactory_requirement(&self, specifier: &RequirementSpecifier) -> Option<&Requirement> {
		self.cached_packages.iter().find(|r| specifier.allows(r))
	}

	/// Remembers an installed requirement unless a cached package already satisfies it.
	///
	/// Index packages also get a `.rob` record in the cache so they are found again the next
	/// time the environment is opened. URL and path requirements are only kept for this session.
	pub fn add_cached_package(&mut self, specifier: &RequirementSpecifier) -> crate::Result<()> {
		if self.find_satisfactory_requirement(specifier).is_some() {
			log::debug!("{} is already cached", specifier);
			return Ok(());
		}

		let requirement = specifier.requirement().clone();
		match (requirement.location(), requirement.rob_filename()) {
			(None, Some(file_name)) => {
				log::debug!("Recording {} in cache as {}", requirement, file_name);
				std::fs::write(self.cache_dir().join(file_name), requirement.freeze_base())?;
			},
			_ => log::debug!("{} has no cache record, keeping it for this session only", requirement),
		}
		self.cached_packages.push(requirement);
		Ok(())
	}

	/// The cached packages in pip requirement format.
	pub fn freeze(&self) -> Vec<String> {
		self.cached_packages.iter().map(|r| r.freeze()).collect()
	}
}

fn read_cached_packages(cache: &Path) -> crate::Result<Vec<Requirement>> {
	let mut packages = Vec::new();
	for entry in walkdir::WalkDir::new(cache).min_depth(1).max_depth(1).sort_by_file_name() {
		let entry = entry.map_err(std::io::Error::from)?;
		if !entry.file_type().is_file() {
			continue;
		}
		match Requirement::from_rob_filename(entry.path()) {
			Some(requirement) => packages.push(requirement),
			None => log::trace!("Ignoring {} in cache", entry.path().display()),
		}
	}
	Ok(packages)
}
