use crate::{lifecycle::GroupState, model::GroupKey};
use core::fmt::{self, Display};
use wasm_bindgen::JsValue;

/// Everything that can go wrong while managing a form widget.
///
/// None of these are fatal to the page: the event-binding layer logs them and leaves the affected widget in its last good state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
	DuplicateKey(GroupKey),
	NotFound(GroupKey),
	/// Removing this group (or constructing the model without any) would leave a mandatory field empty.
	LastGroup(Option<GroupKey>),
	/// Malformed key, role, date or identifier input.
	Validation(String),
	LookupFailure(String),
	NotInteractive { key: GroupKey, state: GroupState },
	/// A JavaScript exception surfaced through `web-sys`, stringified.
	Dom(String),
}

impl std::error::Error for FormError {}

impl Display for FormError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DuplicateKey(key) => write!(f, "group {key} already exists"),
			Self::NotFound(key) => write!(f, "no group {key}"),
			Self::LastGroup(Some(key)) => write!(f, "group {key} is the last group of a mandatory field"),
			Self::LastGroup(None) => f.write_str("a mandatory field needs at least one group"),
			Self::Validation(message) => write!(f, "invalid input: {message}"),
			Self::LookupFailure(message) => write!(f, "lookup failed: {message}"),
			Self::NotInteractive { key, state } => write!(f, "group {key} is {state:?}, not interactive"),
			Self::Dom(message) => write!(f, "DOM error: {message}"),
		}
	}
}

impl From<JsValue> for FormError {
	fn from(value: JsValue) -> Self {
		Self::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
