//! Collapses a requirement list to one entry per package.
//!
//! Later entries win: the list is read as increasing priority, so the surviving value is
//! the last one seen for a package while its position is where the package first appeared.

use std::collections::{HashMap, HashSet};

use crate::RequirementSpecifier;

/// Which packages may appear several times in one installation.
///
/// Requirements whose [`base_name`](crate::Requirement::base_name) is listed are never merged,
/// each occurrence is kept as a separate instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicatePolicy {
	multi_instance: HashSet<String>,
}

impl DuplicatePolicy {
	pub fn new(multi_instance: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			multi_instance: multi_instance.into_iter().map(Into::into).collect(),
		}
	}

	pub fn is_multi_instance(&self, base_name: &str) -> bool {
		self.multi_instance.contains(base_name)
	}

	pub fn remove_duplicates(&self, requirements: Vec<RequirementSpecifier>) -> Vec<RequirementSpecifier> {
		let mut positions = HashMap::<String, usize>::with_capacity(requirements.len());
		let mut unique = Vec::<RequirementSpecifier>::with_capacity(requirements.len());

		for (i, requirement) in requirements.into_iter().enumerate() {
			let mut key = requirement.base_name();
			if self.is_multi_instance(&key) {
				/* `#` can't appear in a name so this can't collide with a real package */
				key = format!("{}#{}", key, i);
			}

			match positions.get(&key) {
				Some(&position) => {
					log::debug!("{} supersedes {}", requirement, unique[position]);
					unique[position] = requirement;
				},
				None => {
					positions.insert(key, unique.len());
					unique.push(requirement);
				},
			}
		}

		unique
	}
}

/// [`DuplicatePolicy::remove_duplicates`] with no multi-instance packages.
pub fn remove_duplicate_requirements(requirements: Vec<RequirementSpecifier>) -> Vec<RequirementSpecifier> {
	DuplicatePolicy::default().remove_duplicates(requirements)
}
