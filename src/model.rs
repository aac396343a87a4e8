//! Keyed state of one repeatable form field.
//!
//! A [`RepeatableGroupModel`] holds the groups of a single field (one per language, one per search row, one per custom key/value pair)
//! in insertion order. Groups are addressed by a stable [`GroupKey`], never by their current position,
//! so removing one group leaves every other group's key (and therefore its serialized input names) untouched.

use crate::{error::FormError, name::SEPARATOR};
use core::{
	fmt::{self, Display},
	str::FromStr,
};
use indexmap::{map::Entry, IndexMap};
use tracing::{instrument, trace};

/// Stable identifier of one group within a [`RepeatableGroupModel`].
///
/// The textual form is unambiguous: all-digit text is always an [`Index`](`GroupKey::Index`),
/// and language codes can't contain `_`, so they never collide with the name separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
	Language(LanguageCode),
	Index(u32),
}

/// A normalized language code. Only [`GroupKey::language`] creates these, so a code is never empty, numeric or separator-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for LanguageCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl GroupKey {
	/// Validates and normalizes a language code.
	///
	/// The two-letter UI codes `fi` and `en` are mapped to the three-letter codes used for stored values.
	pub fn language(code: &str) -> Result<Self, FormError> {
		let code = normalize_language(code);
		if code.is_empty() {
			return Err(FormError::Validation("empty language code".to_owned()));
		}
		if code.bytes().all(|b| b.is_ascii_digit()) {
			return Err(FormError::Validation(format!("language code {code:?} is numeric")));
		}
		if !code.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
			return Err(FormError::Validation(format!("language code {code:?} contains reserved characters")));
		}
		Ok(Self::Language(LanguageCode(code.to_owned())))
	}

	#[must_use]
	pub fn index(index: u32) -> Self {
		Self::Index(index)
	}

	#[must_use]
	pub fn as_index(&self) -> Option<u32> {
		match *self {
			Self::Index(index) => Some(index),
			Self::Language(_) => None,
		}
	}
}

impl Display for GroupKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Language(code) => Display::fmt(code, f),
			Self::Index(index) => write!(f, "{index}"),
		}
	}
}

impl FromStr for GroupKey {
	type Err = FormError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
			s.parse().map(Self::Index).map_err(|_| FormError::Validation(format!("index {s:?} out of range")))
		} else {
			Self::language(s)
		}
	}
}

impl From<u32> for GroupKey {
	fn from(index: u32) -> Self {
		Self::Index(index)
	}
}

/// Maps the UI language codes to the codes stored with multilingual values.
#[must_use]
pub fn normalize_language(code: &str) -> &str {
	match code {
		"fi" => "fin",
		"en" => "eng",
		other => other,
	}
}

/// Checks that `role` can be embedded in a synthesized name.
pub fn validate_role(role: &str) -> Result<(), FormError> {
	if role.is_empty() {
		Err(FormError::Validation("empty role".to_owned()))
	} else if role.contains(SEPARATOR) {
		Err(FormError::Validation(format!("role {role:?} contains the name separator")))
	} else {
		Ok(())
	}
}

/// The values of one group, by role, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldGroup {
	values: IndexMap<String, String>,
}

impl FieldGroup {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Convenience constructor for the common single-input group, stored under the role `"value"`.
	#[must_use]
	pub fn single(value: impl Into<String>) -> Self {
		let mut group = Self::new();
		group.values.insert("value".to_owned(), value.into());
		group
	}

	/// Builds a group from `(role, value)` pairs, rejecting roles that can't be named.
	pub fn from_pairs<R: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (R, V)>) -> Result<Self, FormError> {
		let mut group = Self::new();
		for (role, value) in pairs {
			group.set(role.into(), value.into())?;
		}
		Ok(group)
	}

	pub fn set(&mut self, role: String, value: String) -> Result<(), FormError> {
		validate_role(&role)?;
		self.values.insert(role, value);
		Ok(())
	}

	#[must_use]
	pub fn get(&self, role: &str) -> Option<&str> {
		self.values.get(role).map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values.iter().map(|(role, value)| (role.as_str(), value.as_str()))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// One `(key, role, value)` entry of a [`RepeatableGroupModel::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
	pub key: GroupKey,
	pub role: String,
	pub value: String,
}

/// Whether the owning form field may be left without any groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
	Optional,
	Mandatory,
}

#[derive(Debug, Clone)]
pub struct RepeatableGroupModel {
	groups: IndexMap<GroupKey, FieldGroup>,
	active: Option<GroupKey>,
	policy: Policy,
	index_hint: u32,
}

impl RepeatableGroupModel {
	/// An empty model for a field that may be left blank.
	#[must_use]
	pub fn optional() -> Self {
		Self {
			groups: IndexMap::new(),
			active: None,
			policy: Policy::Optional,
			index_hint: 0,
		}
	}

	/// A mandatory model always starts out with one group, which is also active.
	#[must_use]
	pub fn mandatory(key: GroupKey, group: FieldGroup) -> Self {
		let mut groups = IndexMap::new();
		groups.insert(key.clone(), group);
		Self {
			groups,
			active: Some(key),
			policy: Policy::Mandatory,
			index_hint: 0,
		}
	}

	/// Builds a model from initial values, in order. The first group is active.
	///
	/// # Errors
	///
	/// [`FormError::DuplicateKey`] if a key repeats,
	/// [`FormError::LastGroup`] if `policy` is [`Policy::Mandatory`] but `groups` is empty.
	pub fn from_groups(policy: Policy, groups: impl IntoIterator<Item = (GroupKey, FieldGroup)>) -> Result<Self, FormError> {
		let mut model = Self::optional();
		model.policy = policy;
		for (key, group) in groups {
			match model.groups.entry(key) {
				Entry::Occupied(occupied) => return Err(FormError::DuplicateKey(occupied.key().clone())),
				Entry::Vacant(vacant) => {
					vacant.insert(group);
				}
			}
		}
		if policy == Policy::Mandatory && model.groups.is_empty() {
			return Err(FormError::LastGroup(None));
		}
		model.active = model.groups.keys().next().cloned();
		Ok(model)
	}

	/// Lower bound for [`next_index`](`Self::next_index`), typically the server-rendered row count.
	pub fn set_index_hint(&mut self, hint: u32) {
		self.index_hint = hint;
	}

	#[instrument(skip(self, initial_values))]
	pub fn add_group(&mut self, key: GroupKey, initial_values: FieldGroup) -> Result<(), FormError> {
		match self.groups.entry(key) {
			Entry::Occupied(occupied) => Err(FormError::DuplicateKey(occupied.key().clone())),
			Entry::Vacant(vacant) => {
				self.active = Some(vacant.key().clone());
				vacant.insert(initial_values);
				trace!("Added group. {} group(s) now.", self.groups.len());
				Ok(())
			}
		}
	}

	/// Removes the group and returns its last values.
	#[instrument(skip(self))]
	pub fn remove_group(&mut self, key: &GroupKey) -> Result<FieldGroup, FormError> {
		if !self.groups.contains_key(key) {
			return Err(FormError::NotFound(key.clone()));
		}
		if self.policy == Policy::Mandatory && self.groups.len() == 1 {
			return Err(FormError::LastGroup(Some(key.clone())));
		}
		// `shift_remove` keeps the insertion order of the remaining groups.
		let removed = self.groups.shift_remove(key).ok_or_else(|| FormError::NotFound(key.clone()))?;
		if self.active.as_ref() == Some(key) {
			self.active = self.groups.keys().next().cloned();
			trace!(promoted = ?self.active, "Removed the active group.");
		}
		Ok(removed)
	}

	pub fn set_value(&mut self, key: &GroupKey, role: &str, value: impl Into<String>) -> Result<(), FormError> {
		let group = self.groups.get_mut(key).ok_or_else(|| FormError::NotFound(key.clone()))?;
		group.set(role.to_owned(), value.into())
	}

	pub fn set_active(&mut self, key: &GroupKey) -> Result<(), FormError> {
		if !self.groups.contains_key(key) {
			return Err(FormError::NotFound(key.clone()));
		}
		self.active = Some(key.clone());
		Ok(())
	}

	/// All values as `(key, role, value)` triples, groups in insertion order and roles in insertion order within each group.
	#[must_use]
	pub fn snapshot(&self) -> Vec<SnapshotEntry> {
		self.groups
			.iter()
			.flat_map(|(key, group)| {
				group.iter().map(move |(role, value)| SnapshotEntry {
					key: key.clone(),
					role: role.to_owned(),
					value: value.to_owned(),
				})
			})
			.collect()
	}

	/// A fresh positional key that doesn't disturb any existing one.
	#[must_use]
	pub fn next_index(&self) -> GroupKey {
		let next = self.groups.keys().filter_map(GroupKey::as_index).map(|i| i.saturating_add(1)).max().unwrap_or(0);
		GroupKey::Index(next.max(self.index_hint))
	}

	/// Initial values for a group derived from `key`: roles in `keep` carry their value over, all others start blank.
	pub fn template_from(&self, key: &GroupKey, keep: &[String]) -> Result<FieldGroup, FormError> {
		let source = self.get(key).ok_or_else(|| FormError::NotFound(key.clone()))?;
		let mut template = FieldGroup::new();
		for (role, value) in source.iter() {
			let value = if keep.iter().any(|kept| kept == role) { value } else { "" };
			template.set(role.to_owned(), value.to_owned())?;
		}
		Ok(template)
	}

	#[must_use]
	pub fn get(&self, key: &GroupKey) -> Option<&FieldGroup> {
		self.groups.get(key)
	}

	#[must_use]
	pub fn value(&self, key: &GroupKey, role: &str) -> Option<&str> {
		self.get(key).and_then(|group| group.get(role))
	}

	#[must_use]
	pub fn contains(&self, key: &GroupKey) -> bool {
		self.groups.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
		self.groups.keys()
	}

	#[must_use]
	pub fn last_key(&self) -> Option<&GroupKey> {
		self.groups.keys().last()
	}

	#[must_use]
	pub fn active(&self) -> Option<&GroupKey> {
		self.active.as_ref()
	}

	#[must_use]
	pub fn is_mandatory(&self) -> bool {
		self.policy == Policy::Mandatory
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.groups.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}
}
