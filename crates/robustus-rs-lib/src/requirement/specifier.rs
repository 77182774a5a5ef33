//! Parsing of requirement specifier text.
//!
//! # Grammar
//! ```text
//! specifier    := ["-e" ws] (url | path | name_version)
//! name_version := NAME ws? [("==" | ">=") ws? VERSION] ws? ["#" comment]
//! ```
//! The alternatives are tried in order: anything that parses as an absolute URL is a URL,
//! then anything naming an existing file or directory is a path, and only then is
//! the text matched as a name and version.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Deserialize};
use url::Url;

use super::{Requirement, RequirementError};

fn name_version_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"^([A-Za-z0-9_][\w.-]*)\s*(?:(==|>=)\s*([\w.+!-]+))?\s*(?:#.*)?$")
			.expect("name/version pattern should compile")
	})
}

fn name_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][\w.-]*$").expect("name pattern should compile"))
}

pub(crate) fn is_valid_name(name: &str) -> bool {
	name_regex().is_match(name)
}

/// A [`Requirement`] as written by a user, plus what the text said about acceptable versions.
///
/// Only created by parsing. Serializes to and from its frozen text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequirementSpecifier {
	requirement: Requirement,
	/// Set when `>=` was used rather than `==`.
	pub allow_greater_version: bool,
}

impl RequirementSpecifier {
	/// Parses a single, already joined, specifier line.
	///
	/// # Errors
	/// [`RequirementError::InvalidSpecifier`] holding the trimmed text when the line doesn't follow the grammar,
	/// including empty lines and editable URLs without an `#egg=` name.
	pub fn parse(text: &str) -> Result<Self, RequirementError> {
		let literal = text.trim();
		let invalid = || RequirementError::InvalidSpecifier(literal.to_owned());

		let mut rest = literal;
		let mut editable = false;
		if let Some(after) = rest.strip_prefix("-e") {
			if after.starts_with(char::is_whitespace) {
				editable = true;
				rest = after.trim_start();
			}
		}

		if rest.is_empty() {
			return Err(invalid());
		}

		if let Ok(url) = Url::parse(strip_comment(rest)) {
			log::trace!("Specifier \"{}\" is a URL", literal);
			let requirement = url_requirement(url, editable).ok_or_else(invalid)?;
			return Ok(Self { requirement, allow_greater_version: false });
		}

		if let Some(path) = existing_path(strip_comment(rest)) {
			log::trace!("Specifier \"{}\" is the path {}", literal, path.display());
			return Ok(Self {
				requirement: Requirement::from_path(path).editable(editable),
				allow_greater_version: false,
			});
		}

		let captures = name_version_regex().captures(rest).ok_or_else(invalid)?;
		let name = captures.get(1).ok_or_else(invalid)?.as_str();
		let version = captures.get(3).map(|m| m.as_str().to_owned());
		let allow_greater_version = captures.get(2).is_some_and(|m| m.as_str() == ">=");

		Ok(Self {
			requirement: Requirement::named(name, version).editable(editable),
			allow_greater_version,
		})
	}

	pub fn requirement(&self) -> &Requirement {
		&self.requirement
	}

	pub fn into_requirement(self) -> Requirement {
		self.requirement
	}

	/// See [`Requirement::override_branch`].
	pub fn override_branch(&mut self, tag: &str) -> bool {
		self.requirement.override_branch(tag)
	}

	/// Like [`Requirement::freeze`] but keeps a `>=` comparator.
	pub fn freeze(&self) -> String {
		if self.requirement.is_editable() {
			format!("-e {}", self.freeze_base())
		} else {
			self.freeze_base()
		}
	}

	pub fn freeze_base(&self) -> String {
		let r = &self.requirement;
		match (self.allow_greater_version, r.location(), r.name(), r.version()) {
			(true, None, Some(name), Some(version)) => format!("{}>={}", name, version),
			_ => r.freeze_base(),
		}
	}

	/// Whether installing `other` satisfies this specifier.
	///
	/// URL requirements must come from the same URL, named ones must share the name
	/// and, when this specifier pins one, the version.
	/* TODO: honour `allow_greater_version` once versions are comparable */
	pub fn allows(&self, other: &Requirement) -> bool {
		if let (Some(url), Some(other_url)) = (self.requirement.url(), other.url()) {
			return url == other_url;
		}
		match (self.requirement.name(), other.name()) {
			(Some(name), Some(other_name)) if name == other_name => {
				self.requirement.version().is_none() || self.requirement.version() == other.version()
			},
			_ => false,
		}
	}
}

impl std::ops::Deref for RequirementSpecifier {
	type Target = Requirement;
	fn deref(&self) -> &Self::Target {
		&self.requirement
	}
}

impl std::str::FromStr for RequirementSpecifier {
	type Err = RequirementError;
	fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for RequirementSpecifier {
	type Error = RequirementError;
	fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<RequirementSpecifier> for String {
	fn from(value: RequirementSpecifier) -> Self { value.freeze() }
}

impl std::fmt::Display for RequirementSpecifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.freeze())
	}
}

/// Drops a `#` comment, which needs whitespace before it to not be a URL fragment.
fn strip_comment(text: &str) -> &str {
	match text.find(" #").or_else(|| text.find("\t#")) {
		Some(i) => text[..i].trim_end(),
		None => text,
	}
}

/// Takes the egg name out of the URL fragment.
///
/// Editable URLs must name their package, other URLs may leave it out.
fn url_requirement(mut url: Url, editable: bool) -> Option<Requirement> {
	let mut egg = None;
	if let Some(fragment) = url.fragment().map(str::to_owned) {
		let mut kept = Vec::<&str>::new();
		for part in fragment.split('&') {
			match part.strip_prefix("egg=") {
				Some(name) if egg.is_none() => egg = Some(name.to_owned()),
				_ => kept.push(part),
			}
		}
		let kept = kept.join("&");
		url.set_fragment((!kept.is_empty()).then_some(kept.as_str()));
	}

	match &egg {
		Some(name) if !is_valid_name(name) => return None,
		None if editable => return None,
		_ => {},
	}

	Some(Requirement::from_url(url, egg).editable(editable))
}

/// Expands `~` and makes the path absolute, returning it only if something is there.
fn existing_path(text: &str) -> Option<PathBuf> {
	let expanded = if text == "~" || text.starts_with("~/") {
		let home = std::env::var_os("HOME")?;
		PathBuf::from(home).join(text[1..].trim_start_matches('/'))
	} else {
		PathBuf::from(text)
	};
	let absolute = std::path::absolute(expanded).ok()?;
	absolute.exists().then_some(absolute)
}
