//! Wire names of form inputs.
//!
//! Every input of a repeatable group is submitted as `base__key__role`, which the backend unflattens into nested values.
//! The scheme is reversible so that DOM events can be routed back to the model by name alone.

use crate::model::{validate_role, GroupKey, SnapshotEntry};

/// Joins base name, group key and role. Never appears inside keys or roles.
pub const SEPARATOR: &str = "__";

/// Builds the `name` (and `id`) of the input for `role` within group `key`.
#[must_use]
pub fn synthesize(base: &str, key: &GroupKey, role: &str) -> String {
	debug_assert!(!role.contains(SEPARATOR), "Role {:?} contains the name separator", role);
	format!("{base}{SEPARATOR}{key}{SEPARATOR}{role}")
}

/// Recovers `(key, role)` from a name produced by [`synthesize`] with the same `base`.
///
/// Returns [`None`] for names of other fields or malformed names, including roles that [`synthesize`] can't produce.
#[must_use]
pub fn parse(base: &str, name: &str) -> Option<(GroupKey, String)> {
	let rest = name.strip_prefix(base)?.strip_prefix(SEPARATOR)?;
	// Keys never contain `_`, so the first separator ends the key.
	let (key, role) = rest.split_once(SEPARATOR)?;
	validate_role(role).ok()?;
	Some((key.parse().ok()?, role.to_owned()))
}

/// The `(name, value)` pairs a traditional form submission of `snapshot` contains.
#[must_use]
pub fn submission(base: &str, snapshot: &[SnapshotEntry]) -> Vec<(String, String)> {
	snapshot.iter().map(|entry| (synthesize(base, &entry.key, &entry.role), entry.value.clone())).collect()
}

/// Element ids and input names of the advanced search form.
///
/// That form predates the keyed scheme, and the search handler still expects the text input of row `i`
/// to be named after the field it searches by, as `{by}-{i}`.
pub mod search_row {
	const ROW_PREFIX: &str = "advanced-search-row-";
	const TEXT_PREFIX: &str = "advanced-search-text-";
	const BY_PREFIX: &str = "advanced-search-by-";

	#[must_use]
	pub fn row_id(index: u32) -> String {
		format!("{ROW_PREFIX}{index}")
	}

	#[must_use]
	pub fn text_id(index: u32) -> String {
		format!("{TEXT_PREFIX}{index}")
	}

	#[must_use]
	pub fn by_id(index: u32) -> String {
		format!("{BY_PREFIX}{index}")
	}

	/// Name of the text input of row `index` when searching by field `by`.
	#[must_use]
	pub fn text_name(by: &str, index: u32) -> String {
		format!("{by}-{index}")
	}

	/// The row index at the end of any of the ids above.
	#[must_use]
	pub fn index_of(id: &str) -> Option<u32> {
		let (_, index) = id.rsplit_once('-')?;
		if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}
		index.parse().ok()
	}
}
