//! Version control URLs, `git+<transport>://host/path[@revision]`.

use url::Url;

const GIT_SCHEME_PREFIX: &str = "git+";

/// A git repository and the revision to check out from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitSource {
	/// Repository URL as git understands it, without the `git+` prefix or the revision.
	pub repository: String,
	/// Branch or tag, `None` for the default branch.
	pub revision: Option<String>,
}

impl GitSource {
	pub fn is_git_url(url: &Url) -> bool {
		url.scheme().starts_with(GIT_SCHEME_PREFIX)
	}

	/// Splits a `git+` URL into repository and revision.
	///
	/// The revision separator is searched for in the path only so credentials
	/// such as `git@host` are left alone. Returns `None` for any other scheme.
	pub fn from_url(url: &Url) -> Option<Self> {
		let transport = url.scheme().strip_prefix(GIT_SCHEME_PREFIX)?;

		let mut repository = url.clone();
		repository.set_fragment(None);

		let revision = match url.path().rsplit_once('@') {
			Some((path, revision)) => {
				repository.set_path(path);
				Some(revision.to_owned()).filter(|r| !r.is_empty())
			},
			None => None,
		};

		/* Url won't let us change a scheme from a non-special to a special one so it is swapped as text. */
		let rest = &repository.as_str()[url.scheme().len()..];

		Some(GitSource {
			repository: format!("{}{}", transport, rest),
			revision,
		})
	}
}

impl std::fmt::Display for GitSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.revision {
			Some(revision) => write!(f, "{}@{}", self.repository, revision),
			None => write!(f, "{}", self.repository),
		}
	}
}
