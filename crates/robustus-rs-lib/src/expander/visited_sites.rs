use std::collections::{HashMap, HashSet};

/// Manifests already retrieved during one expansion, keyed by the pinned specifier text.
///
/// Owned by a single top level [`Expander::expand`](super::Expander::expand) call and threaded
/// through every level of recursion, so each site is fetched at most once no matter how many
/// requirements lead to it.
#[derive(Debug, Default)]
pub struct VisitedSites {
	manifests: HashMap<String, Vec<String>>,
	/// Sites whose manifest is currently being expanded further up the call stack.
	in_progress: HashSet<String>,
}

impl VisitedSites {
	/// Returns the cached manifest for `site`, calling `fetch` only the first time the site is seen.
	///
	/// A failed fetch is not cached.
	pub fn get_or_fetch<E>(&mut self, site: &str, fetch: impl FnOnce() -> Result<Vec<String>, E>) -> Result<Vec<String>, E> {
		if let Some(manifest) = self.manifests.get(site) {
			log::debug!("Reusing manifest of {}", site);
			return Ok(manifest.clone());
		}
		let manifest = fetch()?;
		self.manifests.insert(site.to_owned(), manifest.clone());
		Ok(manifest)
	}

	pub fn contains(&self, site: &str) -> bool {
		self.manifests.contains_key(site)
	}

	pub fn len(&self) -> usize {
		self.manifests.len()
	}

	pub fn is_empty(&self) -> bool {
		self.manifests.is_empty()
	}

	/// Marks `site` as being expanded. `false` when it already is, meaning the manifests form a cycle.
	pub(super) fn enter(&mut self, site: &str) -> bool {
		self.in_progress.insert(site.to_owned())
	}

	pub(super) fn leave(&mut self, site: &str) {
		self.in_progress.remove(site);
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn fetches_once() {
		let mut sites = VisitedSites::default();
		let mut calls = 0;
		for _ in 0..3 {
			let manifest = sites.get_or_fetch::<()>("-e git+https://host/a#egg=a", || { calls += 1; Ok(vec!["b".into()]) }).unwrap();
			assert_eq!(manifest, vec!["b"]);
		}
		assert_eq!(calls, 1);
		assert_eq!(sites.len(), 1);
	}

	#[test]
	fn failures_are_not_cached() {
		let mut sites = VisitedSites::default();
		assert!(sites.get_or_fetch("a", || Err("offline")).is_err());
		assert!(!sites.contains("a"));
		assert!(sites.get_or_fetch::<&str>("a", || Ok(vec![])).is_ok());
		assert!(sites.contains("a"));
	}

	#[test]
	fn reentry_is_detected() {
		let mut sites = VisitedSites::default();
		assert!(sites.enter("a"));
		assert!(!sites.enter("a"));
		sites.leave("a");
		assert!(sites.enter("a"));
	}
}
