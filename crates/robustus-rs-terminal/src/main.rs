use std::path::PathBuf;

use robustus_rs::config::{Config, ConfigOverrides, SETTINGS_FILE};
use robustus_rs::fetcher::GitFetcher;
use robustus_rs::installer::InstallerRegistry;
use robustus_rs::{Environment, Expander, RequirementSpecifier};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag(     "h", "help",                "Show help");
		opts.optflagmulti("v", "verbose",             "Increase verbosity, repeat for more");
		opts.optflag(     "",  "debug",               "Log debug output and keep build directories for inspection");
		opts.optopt(      "",  "env",                 "Environment to work in, defaults to $VIRTUAL_ENV", "DIR");
		opts.optopt(      "",  "cache",               "Wheel cache directory", "DIR");
		opts.optmulti(    "r", "requirement",         "Install from the given requirements file", "FILE");
		opts.optmulti(    "e", "editable",            "Install an editable requirement", "SPEC");
		opts.optmulti(    "f", "find-links",          "Extra location to look for packages in", "URL");
		opts.optopt(      "",  "tag",                 "Switch every editable git requirement to this branch or tag", "TAG");
		opts.optflag(     "",  "ignore-missing-refs", "Use the default branch when a branch or tag doesn't exist");
		opts.optflag(     "",  "update-editables",    "Reinstall editable requirements that are already checked out");
		opts.optflag(     "",  "json",                "Print the expanded plan as JSON");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { eprintln!("Unable to parse options: {}", e); std::process::exit(2) }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: robustus-rs [options] (install|expand|freeze) [SPEC...]"));
			return;
		}

		parsed_options
	};

	let level = logging_settings(&parsed_options).log_level().to_string();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	let result = match parsed_options.free.first().map(String::as_str) {
		Some("install") => install(&parsed_options),
		Some("expand") => expand(&parsed_options),
		Some("freeze") => freeze(&parsed_options),
		Some(other) => Err(Error::UnknownCommand(other.to_string())),
		None => Err(Error::MissingCommand),
	};

	if let Err(e) = result {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

fn overrides(options: &getopts::Matches) -> ConfigOverrides {
	let verbosity = options.opt_count("v");
	ConfigOverrides {
		cache: options.opt_str("cache").map(PathBuf::from),
		find_links: options.opt_strs("f"),
		verbosity: (verbosity > 0).then(|| verbosity.min(u8::MAX as usize) as u8),
		debug: options.opt_present("debug"),
		update_editables: options.opt_present("update-editables"),
	}
}

fn environment_path(options: &getopts::Matches) -> Option<PathBuf> {
	options
		.opt_str("env")
		.or_else(|| std::env::var("VIRTUAL_ENV").ok())
		.map(PathBuf::from)
}

/// Settings of the environment, if there is a readable one, with the command line applied.
///
/// Only used to pick a log level before the logger exists, problems with the settings are
/// reported once the environment is actually opened.
fn logging_settings(options: &getopts::Matches) -> Config {
	let mut config = environment_path(options)
		.and_then(|path| Config::load_from_disk(path.join(SETTINGS_FILE)).ok())
		.unwrap_or_default();
	config.apply(&overrides(options));
	config
}

fn open_environment(options: &getopts::Matches) -> Result<Environment, Error> {
	let path = environment_path(options).ok_or(Error::NoEnvironment)?;
	Ok(Environment::open(path, &overrides(options))?)
}

/// Positional specifiers followed by the `-e` ones.
fn specifiers(options: &getopts::Matches) -> Vec<String> {
	options.free[1..]
		.iter()
		.cloned()
		.chain(options.opt_strs("e").into_iter().map(|s| format!("-e {}", s)))
		.collect()
}

fn build_plan(options: &getopts::Matches, config: &Config) -> Result<Vec<RequirementSpecifier>, Error> {
	let fetcher = GitFetcher::default();
	let files: Vec<PathBuf> = options.opt_strs("r").into_iter().map(PathBuf::from).collect();

	let plan = Expander::new(&fetcher)
		.tag(options.opt_str("tag"))
		.ignore_missing_refs(options.opt_present("ignore-missing-refs"))
		.duplicate_policy(config.duplicate_policy())
		.expand_all(&specifiers(options), &files)?;
	Ok(plan)
}

fn install(options: &getopts::Matches) -> Result<(), Error> {
	let mut env = open_environment(options)?;
	let plan = build_plan(options, env.config())?;

	log::info!("Here are all packages that will be installed:");
	for requirement in &plan {
		log::info!("\t{}", requirement);
	}

	InstallerRegistry::default().install_all(&mut env, &plan, options.opt_str("tag").as_deref())?;
	log::info!("Installed {} packages into {}", plan.len(), env.path().display());
	Ok(())
}

/// Like install but only prints the plan. Works without an environment using the default settings.
fn expand(options: &getopts::Matches) -> Result<(), Error> {
	let config = match environment_path(options) {
		Some(_) => open_environment(options)?.config().clone(),
		None => {
			let mut config = Config::default();
			config.apply(&overrides(options));
			config
		},
	};
	let plan = build_plan(options, &config)?;

	if options.opt_present("json") {
		println!("{}", serde_json::to_string_pretty(&plan)?);
	} else {
		for requirement in &plan {
			println!("{}", requirement.freeze());
		}
	}
	Ok(())
}

fn freeze(options: &getopts::Matches) -> Result<(), Error> {
	let env = open_environment(options)?;
	for line in env.freeze() {
		println!("{}", line);
	}
	Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Robustus(#[from] robustus_rs::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("no environment given, use --env or activate one")]
	NoEnvironment,
	#[error("no command given, expected one of install, expand, freeze")]
	MissingCommand,
	#[error("unknown command \"{0}\"")]
	UnknownCommand(String),
}
