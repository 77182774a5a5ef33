//! Installs an expanded plan into an environment.
//!
//! Most packages are handed straight to pip. Packages that need special treatment get their own
//! [`Installer`] registered by name, everything else falls through to the registry's fallback.

use std::collections::HashMap;

use crate::{Environment, RequirementSpecifier};

mod pip;
pub use pip::PipInstaller;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
	#[error("`{command}` failed with {status}")]
	Command { command: String, status: std::process::ExitStatus },
	#[error("{0} does not exist")]
	MissingExecutable(std::path::PathBuf),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

pub trait Installer {
	fn install(&self, env: &Environment, requirement: &RequirementSpecifier) -> Result<(), InstallError>;
}

/// Maps lower-cased package names to the installer responsible for them.
pub struct InstallerRegistry {
	installers: HashMap<String, Box<dyn Installer>>,
	fallback: Box<dyn Installer>,
}

impl Default for InstallerRegistry {
	fn default() -> Self {
		Self::new(Box::new(PipInstaller))
	}
}

impl InstallerRegistry {
	pub fn new(fallback: Box<dyn Installer>) -> Self {
		Self {
			installers: HashMap::new(),
			fallback,
		}
	}

	/// Replaces any installer already registered for `name`.
	pub fn register(&mut self, name: &str, installer: Box<dyn Installer>) {
		self.installers.insert(name.to_lowercase(), installer);
	}

	pub fn installer_for(&self, requirement: &RequirementSpecifier) -> &dyn Installer {
		requirement
			.name()
			.and_then(|name| self.installers.get(&name.to_lowercase()))
			.unwrap_or(&self.fallback)
			.as_ref()
	}

	/// Installs every requirement of `plan` in order, stopping at the first failure.
	///
	/// Each successful install is added to the environment's cached packages.
	/// Editable requirements that are already checked out are skipped unless the environment
	/// updates editables or a `tag` was requested for this installation.
	pub fn install_all(&self, env: &mut Environment, plan: &[RequirementSpecifier], tag: Option<&str>) -> crate::Result<()> {
		for requirement in plan {
			if is_checked_out(env, requirement) && !env.config().update_editables() && tag.is_none() {
				log::info!("Skipping {}, already checked out", requirement);
				continue;
			}

			log::info!("Installing {}", requirement);
			self.installer_for(requirement).install(env, requirement)?;
			env.add_cached_package(requirement)?;
		}
		Ok(())
	}
}

fn is_checked_out(env: &Environment, requirement: &RequirementSpecifier) -> bool {
	match (requirement.is_editable(), requirement.url(), requirement.name()) {
		(true, Some(_), Some(name)) => env.editable_checkout_dir(name).exists(),
		_ => false,
	}
}
