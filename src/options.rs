//! Initialization data of a repeatable field widget.
//!
//! Options come from the page in one of three shapes: a JSON string, a JavaScript object,
//! or the `data-module-*` attributes of the widget's root element (each attribute value is read as JSON if it parses, and as a plain string otherwise).

use crate::{
	error::FormError,
	model::{FieldGroup, GroupKey, Policy, RepeatableGroupModel},
};
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use tracing::{instrument, trace, warn};
use wasm_bindgen::JsValue;

const DATA_PREFIX: &str = "data-module-";

/// The initial value of one group: either a bare string for single-input groups or a role → value mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
	Single(String),
	Roles(IndexMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WidgetOptions {
	/// Base name of the submitted inputs.
	pub name: String,
	/// The initially active key, usually the UI language.
	pub current: Option<String>,
	/// Initial groups by key, in order.
	pub values: IndexMap<String, InitialValue>,
	/// Counter hint: positional keys handed out for new groups start here.
	pub index: Option<u32>,
	/// Roles whose value is carried over into appended groups.
	pub keep: Vec<String>,
	/// Roles rendered hidden in appended groups.
	pub hide: Vec<String>,
	/// Whether each group gets a remove control.
	pub remove: bool,
	pub mandatory: bool,
	/// Roles each group renders an input for.
	pub roles: Vec<String>,
	/// Append a fresh group once the last group's first role is filled in.
	pub auto_append: bool,
	/// Hide all groups except the active one.
	pub hide_inactive: bool,
}

impl Default for WidgetOptions {
	fn default() -> Self {
		Self {
			name: String::new(),
			current: None,
			values: IndexMap::new(),
			index: None,
			keep: Vec::new(),
			hide: Vec::new(),
			remove: true,
			mandatory: false,
			roles: vec!["value".to_owned()],
			auto_append: false,
			hide_inactive: false,
		}
	}
}

impl WidgetOptions {
	pub fn from_json(json: &str) -> Result<Self, FormError> {
		serde_json::from_str(json).map_err(|error| FormError::Validation(format!("widget options: {error}")))
	}

	pub fn from_js(value: JsValue) -> Result<Self, FormError> {
		serde_wasm_bindgen::from_value(value).map_err(|error| FormError::Validation(format!("widget options: {error}")))
	}

	/// Reads `data-module-*` attributes, so `data-module-name="title"` becomes the `name` option.
	pub fn from_element(element: &web_sys::Element) -> Result<Self, FormError> {
		from_element(element)
	}

	/// The browser-independent part of [`from_element`](`Self::from_element`).
	pub fn from_attributes(attributes: impl IntoIterator<Item = (String, String)>) -> Result<Self, FormError> {
		from_attributes(attributes)
	}

	/// The normalized initially active key, if one was given and is well-formed.
	#[must_use]
	pub fn current_key(&self) -> Option<GroupKey> {
		let current = self.current.as_deref()?;
		match current.parse() {
			Ok(key) => Some(key),
			Err(error) => {
				warn!("Ignoring malformed `current` option: {}", error);
				None
			}
		}
	}

	/// A group with an empty value for every configured role.
	pub fn blank_group(&self) -> Result<FieldGroup, FormError> {
		FieldGroup::from_pairs(self.roles.iter().map(|role| (role.as_str(), "")))
	}

	fn initial_group(&self, value: &InitialValue) -> Result<FieldGroup, FormError> {
		let mut group = self.blank_group()?;
		match value {
			InitialValue::Single(value) => {
				let role = self.roles.first().map_or("value", String::as_str);
				group.set(role.to_owned(), value.clone())?;
			}
			InitialValue::Roles(values) => {
				for (role, value) in values {
					group.set(role.clone(), value.clone())?;
				}
			}
		}
		Ok(group)
	}

	/// Builds the model these options describe.
	///
	/// A mandatory field without initial values gets one blank group, keyed by `current` or by the counter hint.
	#[instrument(skip(self), fields(name = %self.name))]
	pub fn build_model(&self) -> Result<RepeatableGroupModel, FormError> {
		let policy = if self.mandatory { Policy::Mandatory } else { Policy::Optional };
		let mut groups = Vec::with_capacity(self.values.len());
		for (key, value) in &self.values {
			groups.push((key.parse::<GroupKey>()?, self.initial_group(value)?));
		}
		if groups.is_empty() && self.mandatory {
			let seed = self.current_key().unwrap_or_else(|| GroupKey::Index(self.index.unwrap_or(0)));
			trace!("Seeding mandatory field with group {}", seed);
			groups.push((seed, self.blank_group()?));
		}

		let mut model = RepeatableGroupModel::from_groups(policy, groups)?;
		if let Some(index) = self.index {
			model.set_index_hint(index);
		}
		if let Some(current) = self.current_key() {
			if model.contains(&current) {
				model.set_active(&current)?;
			}
		}
		Ok(model)
	}
}

/// Deserializes any options type from the `data-module-*` attributes of `element`.
#[instrument(skip(element))]
pub fn from_element<T: DeserializeOwned>(element: &web_sys::Element) -> Result<T, FormError> {
	let attributes = element.attributes();
	from_attributes((0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| (attribute.local_name(), attribute.value())))
}

/// Deserializes any options type from `(attribute name, attribute value)` pairs. Attributes without the `data-module-` prefix are skipped.
pub fn from_attributes<T: DeserializeOwned>(attributes: impl IntoIterator<Item = (String, String)>) -> Result<T, FormError> {
	let mut map = Map::new();
	for (name, value) in attributes {
		let option = match name.strip_prefix(DATA_PREFIX) {
			Some(option) if !option.is_empty() => option.to_owned(),
			_ => continue,
		};
		let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
		trace!("Option {:?}", option);
		map.insert(option, value);
	}
	serde_json::from_value(Value::Object(map)).map_err(|error| FormError::Validation(format!("widget options: {error}")))
}
