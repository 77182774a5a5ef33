use std::process::Command;

use super::{InstallError, Installer};
use crate::{Environment, RequirementSpecifier};

/// Installs with the environment's own `pip`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipInstaller;

impl PipInstaller {
	/// The arguments passed to pip for `requirement`.
	///
	/// Pip is quiet unless the environment is verbose, and keeps its build directories in debug mode.
	pub fn arguments(env: &Environment, requirement: &RequirementSpecifier) -> Vec<String> {
		let mut args = vec!["install".to_string()];
		if requirement.is_editable() {
			args.push("-e".to_string());
		}
		args.push(requirement.freeze_base());
		match env.config().verbosity() {
			0 => args.push("-q".to_string()),
			1 => {},
			_ => args.push("-v".to_string()),
		}
		if env.config().debug() {
			args.push("--no-clean".to_string());
		}
		args.extend(env.config().find_links().iter().map(|link| format!("--find-links={}", link)));
		args
	}
}

impl Installer for PipInstaller {
	fn install(&self, env: &Environment, requirement: &RequirementSpecifier) -> Result<(), InstallError> {
		let pip = env.pip();
		if !pip.exists() {
			return Err(InstallError::MissingExecutable(pip.to_path_buf()));
		}

		let args = Self::arguments(env, requirement);
		let command = format!("{} {}", pip.display(), args.join(" "));
		log::debug!("Running {}", command);

		let status = Command::new(pip).args(&args).current_dir(env.path()).status()?;
		if !status.success() {
			return Err(InstallError::Command { command, status });
		}
		Ok(())
	}
}
