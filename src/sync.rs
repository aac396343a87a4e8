use crate::{
	error::FormError,
	lifecycle::{GroupState, Lifecycles},
	logging::shown,
	model::{FieldGroup, GroupKey, Policy, RepeatableGroupModel, SnapshotEntry},
	name,
	options::WidgetOptions,
};
use core::{
	any::type_name,
	cell::{RefCell, RefMut},
	fmt::{self, Debug},
};
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::rc::{Rc, Weak};
use tracing::{debug, error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

const GROUP_CLASS: &str = "repeatable-group";
const ACTIVE_CLASS: &str = "active";
const HIDDEN_CLASS: &str = "hidden";
const KEY_ATTRIBUTE: &str = "data-group-key";
const ROLE_ATTRIBUTE: &str = "data-role";
const ACTION_ATTRIBUTE: &str = "data-action";
const LISTENED_EVENTS: [&str; 3] = ["input", "change", "click"];

/// Attached to a container [***Element***](https://developer.mozilla.org/en-US/docs/Web/API/element) during instantiation,
/// this `struct` keeps one subtree per group of a [`RepeatableGroupModel`] in the container's children.
///
/// Each model mutation results in the smallest matching DOM change: adding or removing a group adds or removes exactly its own subtree,
/// value changes update a single input and activation toggles classes on the previously and newly active subtrees.
/// Other groups' inputs, including their names, are never touched.
///
/// Events are handled by a single delegated listener on the container, which routes them to the model by parsing the target input's `name`.
/// Failures on that path are logged and otherwise ignored, so a misbehaving widget never throws into the page.
///
/// # Markup
///
/// ```html
/// <div class="repeatable-group active" data-group-key="fin">
///   <input type="text" name="title__fin__value" id="title__fin__value" data-role="value">
///   <button type="button" data-action="remove">×</button>
/// </div>
/// ```
///
/// Server-rendered inputs whose names parse under the base name are adopted instead of re-rendered.
/// Their groups must be wrapped like the markup above, each in its own element carrying `data-group-key`.
/// Any element with `data-action="activate"` or `data-action="add"` inside the container activates its group or appends a new one, respectively.
pub struct DomSynchronizer {
	inner: Rc<RefCell<Inner>>,
	container: Element,
	common_handler: Closure<dyn Fn(web_sys::Event)>,
}

struct GroupNodes {
	root: Element,
	inputs: HashMap<String, HtmlInputElement>,
}

struct Inner {
	options: WidgetOptions,
	model: RepeatableGroupModel,
	document: Document,
	container: Element,
	nodes: HashMap<GroupKey, GroupNodes>,
	lifecycles: Lifecycles,
}

impl DomSynchronizer {
	#[instrument(skip(options), fields(name = %options.name))]
	pub fn new(container: Element, options: WidgetOptions) -> Result<Self, FormError> {
		let document = container.owner_document().ok_or_else(|| FormError::Dom("no owner document found for the container".to_owned()))?;

		let mut inner = Inner {
			model: RepeatableGroupModel::optional(),
			options,
			document,
			container: container.clone(),
			nodes: HashMap::new(),
			lifecycles: Lifecycles::new(),
		};
		inner.initialize()?;
		let inner = Rc::new(RefCell::new(inner));

		let common_handler = {
			let inner = Rc::downgrade(&inner);
			Closure::wrap(Box::new(move |event: web_sys::Event| {
				let span = trace_span!("common_handler", event_type = %event.type_());
				let _enter = span.enter();
				handle_event(&inner, &event);
			}) as Box<dyn Fn(web_sys::Event)>)
		};
		for event in LISTENED_EVENTS {
			container.add_event_listener_with_callback(event, common_handler.as_ref().unchecked_ref())?;
		}

		Ok(Self { inner, container, common_handler })
	}

	/// Reads [`WidgetOptions`] from the container's `data-module-*` attributes.
	pub fn from_element(container: Element) -> Result<Self, FormError> {
		let options = WidgetOptions::from_element(&container)?;
		Self::new(container, options)
	}

	fn inner(&self) -> Result<RefMut<'_, Inner>, FormError> {
		self.inner.try_borrow_mut().map_err(|_| FormError::Dom("re-entrant update of a repeatable field".to_owned()))
	}

	#[instrument(skip(self, initial_values))]
	pub fn add_group(&self, key: GroupKey, initial_values: FieldGroup) -> Result<(), FormError> {
		self.inner()?.add_group(key, initial_values, &[])
	}

	/// Appends a positional group with a fresh index, carrying over the `keep` roles of the last group.
	pub fn append_group(&self) -> Result<GroupKey, FormError> {
		self.inner()?.append_group()
	}

	#[instrument(skip(self))]
	pub fn remove_group(&self, key: &GroupKey) -> Result<(), FormError> {
		self.inner()?.remove_group(key)
	}

	#[instrument(skip(self, value), fields(value = shown(value)))]
	pub fn set_value(&self, key: &GroupKey, role: &str, value: &str) -> Result<(), FormError> {
		self.inner()?.set_value(key, role, value)
	}

	#[instrument(skip(self))]
	pub fn set_active(&self, key: &GroupKey) -> Result<(), FormError> {
		self.inner()?.set_active(key)
	}

	#[must_use]
	pub fn snapshot(&self) -> Vec<SnapshotEntry> {
		self.inner.borrow().model.snapshot()
	}

	/// The `(name, value)` pairs a form submission would contain.
	#[must_use]
	pub fn submission(&self) -> Vec<(String, String)> {
		let inner = self.inner.borrow();
		name::submission(&inner.options.name, &inner.model.snapshot())
	}

	pub fn with_model<T>(&self, f: impl FnOnce(&RepeatableGroupModel) -> T) -> T {
		f(&self.inner.borrow().model)
	}

	#[must_use]
	pub fn state(&self, key: &GroupKey) -> GroupState {
		self.inner.borrow().lifecycles.state(key)
	}
}

impl Drop for DomSynchronizer {
	fn drop(&mut self) {
		for event in LISTENED_EVENTS {
			if let Err(error) = self.container.remove_event_listener_with_callback(event, self.common_handler.as_ref().unchecked_ref()) {
				error!("Failed to remove {:?} listener: {:?}", event, error);
			}
		}
	}
}

impl Debug for DomSynchronizer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("DomSynchronizer");
		debug.field("container", &self.container);
		match self.inner.try_borrow() {
			Ok(inner) => debug.field("name", &inner.options.name).field("model", &inner.model),
			Err(_) => debug.field("inner", &"<borrowed>"),
		};
		debug.finish()
	}
}

fn handle_event(inner: &Weak<RefCell<Inner>>, event: &web_sys::Event) {
	let inner = match inner.upgrade() {
		Some(inner) => inner,
		None => return warn!("Event after the repeatable field was dropped."),
	};
	let mut inner = match inner.try_borrow_mut() {
		Ok(inner) => inner,
		Err(_) => return error!("Re-entrant {:?} event rejected.", event.type_()),
	};
	let target = match event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
		Some(target) => target,
		None => return trace!("Event without element target."),
	};

	let result = match event.type_().as_str() {
		"input" | "change" => match target.dyn_ref::<HtmlInputElement>() {
			Some(input) => inner.on_input(input),
			None => Ok(()),
		},
		"click" => inner.on_click(&target),
		other => {
			warn!("Unexpected event type {:?}", other);
			Ok(())
		}
	};
	if let Err(error) = result {
		error!("Repeatable field {:?}: {}", inner.options.name, error);
	}
}

fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T, FormError> {
	document.create_element(tag)?.dyn_into::<T>().map_err(|element| FormError::Dom(format!("<{}> is not a `{}`: {:?}", tag, type_name::<T>(), element)))
}

impl Inner {
	/// Adopts server-rendered inputs, or renders the groups described by the options if there are none.
	fn initialize(&mut self) -> Result<(), FormError> {
		let adopted = self.adopt()?;
		if adopted.is_empty() {
			self.model = self.options.build_model()?;
			let keys: Vec<GroupKey> = self.model.keys().cloned().collect();
			for key in keys {
				self.render_group(&key, &[])?;
			}
		} else {
			debug!("Adopted {} server-rendered group(s).", adopted.len());
			let policy = if self.options.mandatory { Policy::Mandatory } else { Policy::Optional };
			let mut groups = Vec::with_capacity(adopted.len());
			for (key, (nodes, group)) in adopted {
				self.lifecycles.advance(&key, GroupState::Rendering)?;
				self.lifecycles.advance(&key, GroupState::Interactive)?;
				self.nodes.insert(key.clone(), nodes);
				groups.push((key, group));
			}
			self.model = RepeatableGroupModel::from_groups(policy, groups)?;
			if let Some(index) = self.options.index {
				self.model.set_index_hint(index);
			}
			if let Some(current) = self.options.current_key() {
				if self.model.contains(&current) {
					self.model.set_active(&current)?;
				}
			}
		}

		let active = self.model.active().cloned();
		let keys: Vec<GroupKey> = self.model.keys().cloned().collect();
		for key in &keys {
			self.mark_active(key, active.as_ref() == Some(key));
		}
		Ok(())
	}

	/// Collects inputs in the container whose names parse under the base name, grouped by key in DOM order.
	///
	/// Each adopted group must sit in its own element carrying its key in `data-group-key` inside the container,
	/// which then is the subtree removed along with the group.
	fn adopt(&self) -> Result<IndexMap<GroupKey, (GroupNodes, FieldGroup)>, FormError> {
		let mut adopted = IndexMap::<GroupKey, (GroupNodes, FieldGroup)>::new();
		let prefix = format!("{}{}", self.options.name, name::SEPARATOR);
		let inputs = self.container.query_selector_all("input[name]")?;
		for i in 0..inputs.length() {
			let input = match inputs.item(i).and_then(|node| node.dyn_into::<HtmlInputElement>().ok()) {
				Some(input) => input,
				None => continue,
			};
			let input_name = input.name();
			let (key, role) = match name::parse(&self.options.name, &input_name) {
				Some(parsed) => parsed,
				None => {
					if input_name.starts_with(&prefix) {
						warn!("Not adopting input {:?}: malformed name.", input_name);
					}
					continue;
				}
			};
			let span = trace_span!("Adopting input", %key, role = role.as_str());
			let _enter = span.enter();

			let (nodes, group) = match adopted.entry(key) {
				indexmap::map::Entry::Occupied(occupied) => occupied.into_mut(),
				indexmap::map::Entry::Vacant(vacant) => {
					let root = self.group_root(&input, vacant.key())?;
					vacant.insert((GroupNodes { root, inputs: HashMap::new() }, FieldGroup::new()))
				}
			};
			group.set(role.clone(), input.value())?;
			nodes.inputs.insert(role, input);
		}
		Ok(adopted)
	}

	/// The element below the container that holds exactly the group `key` of an adopted `input`.
	fn group_root(&self, input: &HtmlInputElement, key: &GroupKey) -> Result<Element, FormError> {
		let root = input
			.closest(&format!("[{KEY_ATTRIBUTE}]"))?
			.filter(|root| root != &self.container && self.container.contains(Some(root.as_ref())));
		match root {
			Some(root) if root.get_attribute(KEY_ATTRIBUTE).as_deref() == Some(key.to_string().as_str()) => Ok(root),
			Some(_) | None => {
				error!("Input {:?} isn't wrapped in an element with {}=\"{}\".", input.name(), KEY_ATTRIBUTE, key);
				Err(FormError::Validation(format!("server-rendered group {key} has no element of its own")))
			}
		}
	}

	fn render_group(&mut self, key: &GroupKey, hidden_roles: &[String]) -> Result<(), FormError> {
		let span = trace_span!("Rendering group", %key);
		let _enter = span.enter();
		self.lifecycles.advance(key, GroupState::Rendering)?;
		match self.build_group(key, hidden_roles) {
			Ok(nodes) => {
				self.nodes.insert(key.clone(), nodes);
				self.lifecycles.advance(key, GroupState::Interactive)
			}
			Err(error) => {
				self.lifecycles.abort(key);
				Err(error)
			}
		}
	}

	fn build_group(&self, key: &GroupKey, hidden_roles: &[String]) -> Result<GroupNodes, FormError> {
		let group = self.model.get(key).ok_or_else(|| FormError::NotFound(key.clone()))?;
		let root: Element = create(&self.document, "div")?;
		root.set_class_name(GROUP_CLASS);
		root.set_attribute(KEY_ATTRIBUTE, &key.to_string())?;

		let mut inputs = HashMap::with_capacity(group.len());
		for (role, value) in group.iter() {
			let input = self.build_input(key, role, value)?;
			if hidden_roles.iter().any(|hidden| hidden == role) {
				input.set_hidden(true);
			}
			root.append_child(&input)?;
			inputs.insert(role.to_owned(), input);
		}

		if self.options.remove {
			let button: HtmlElement = create(&self.document, "button")?;
			button.set_attribute("type", "button")?;
			button.set_attribute(ACTION_ATTRIBUTE, "remove")?;
			button.set_text_content(Some("×"));
			root.append_child(&button)?;
		}

		// Attaching last, so a failure above leaves the container untouched.
		self.container.append_child(&root)?;
		Ok(GroupNodes { root, inputs })
	}

	fn build_input(&self, key: &GroupKey, role: &str, value: &str) -> Result<HtmlInputElement, FormError> {
		let name = name::synthesize(&self.options.name, key, role);
		let input: HtmlInputElement = create(&self.document, "input")?;
		input.set_type("text");
		input.set_name(&name);
		input.set_id(&name);
		input.set_attribute(ROLE_ATTRIBUTE, role)?;
		input.set_value(value);
		Ok(input)
	}

	fn mark_active(&self, key: &GroupKey, active: bool) {
		let nodes = match self.nodes.get(key) {
			Some(nodes) => nodes,
			None => return error!("No DOM nodes for group {}.", key),
		};
		let classes = nodes.root.class_list();
		if let Err(error) = classes.toggle_with_force(ACTIVE_CLASS, active) {
			error!("Failed to toggle {:?} on group {}: {:?}", ACTIVE_CLASS, key, error);
		}
		if self.options.hide_inactive {
			if let Err(error) = classes.toggle_with_force(HIDDEN_CLASS, !active) {
				error!("Failed to toggle {:?} on group {}: {:?}", HIDDEN_CLASS, key, error);
			}
		}
	}

	/// Moves the active markers from `previous` to the model's active group.
	fn move_active(&self, previous: Option<&GroupKey>) {
		let active = self.model.active();
		if previous == active {
			return;
		}
		if let Some(previous) = previous {
			if self.nodes.contains_key(previous) {
				self.mark_active(previous, false);
			}
		}
		if let Some(active) = active {
			self.mark_active(active, true);
		}
	}

	fn add_group(&mut self, key: GroupKey, initial_values: FieldGroup, hidden_roles: &[String]) -> Result<(), FormError> {
		let previous = self.model.active().cloned();
		self.model.add_group(key.clone(), initial_values)?;
		if let Err(error) = self.render_group(&key, hidden_roles) {
			// Roll back so model and DOM keep agreeing.
			if let Err(rollback) = self.model.remove_group(&key) {
				error!("Failed to roll back group {}: {}", key, rollback);
			}
			if let Some(previous) = &previous {
				if let Err(restore) = self.model.set_active(previous) {
					error!("Failed to restore active group {}: {}", previous, restore);
				}
			}
			return Err(error);
		}
		self.move_active(previous.as_ref());
		Ok(())
	}

	fn append_group(&mut self) -> Result<GroupKey, FormError> {
		let key = self.model.next_index();
		let template = match self.model.last_key() {
			Some(last) => self.model.template_from(last, &self.options.keep)?,
			None => self.options.blank_group()?,
		};
		let hidden_roles = self.options.hide.clone();
		self.add_group(key.clone(), template, &hidden_roles)?;
		Ok(key)
	}

	fn remove_group(&mut self, key: &GroupKey) -> Result<(), FormError> {
		self.lifecycles.require_interactive(key)?;
		let previous = self.model.active().cloned();
		self.model.remove_group(key)?;

		let span = trace_span!("Removing group", %key);
		let _enter = span.enter();
		self.lifecycles.advance(key, GroupState::Removing)?;
		match self.nodes.remove(key) {
			Some(nodes) => nodes.root.remove(),
			None => error!("Expected to remove DOM nodes of group {} but found none.", key),
		}
		self.lifecycles.advance(key, GroupState::Absent)?;

		let previous = previous.filter(|previous| previous != key);
		if previous.is_none() {
			if let Some(active) = self.model.active() {
				self.mark_active(active, true);
			}
		} else {
			self.move_active(previous.as_ref());
		}
		Ok(())
	}

	fn set_value(&mut self, key: &GroupKey, role: &str, value: &str) -> Result<(), FormError> {
		self.lifecycles.require_interactive(key)?;
		self.model.set_value(key, role, value)?;

		let span = trace_span!("Updating input", %key, role);
		let _enter = span.enter();
		let existing = self.nodes.get(key).and_then(|nodes| nodes.inputs.get(role)).cloned();
		match existing {
			Some(input) => {
				if input.value() != value {
					input.set_value(value);
				}
			}
			None => {
				let input = self.build_input(key, role, value)?;
				let nodes = self.nodes.get_mut(key).ok_or_else(|| FormError::NotFound(key.clone()))?;
				nodes.root.append_child(&input)?;
				nodes.inputs.insert(role.to_owned(), input);
			}
		}
		Ok(())
	}

	fn set_active(&mut self, key: &GroupKey) -> Result<(), FormError> {
		self.lifecycles.require_interactive(key)?;
		let previous = self.model.active().cloned();
		self.model.set_active(key)?;
		self.move_active(previous.as_ref());
		Ok(())
	}

	/// The input's DOM value is already current; only the model catches up.
	fn on_input(&mut self, input: &HtmlInputElement) -> Result<(), FormError> {
		let (key, role) = match name::parse(&self.options.name, &input.name()) {
			Some(parsed) => parsed,
			None => return Ok(()),
		};
		let value = input.value();
		trace!(%key, role = role.as_str(), value = shown(&value), "Input");
		self.lifecycles.require_interactive(&key)?;
		self.model.set_value(&key, &role, value.as_str())?;

		let first_role = self.options.roles.first().map(String::as_str);
		if self.options.auto_append && !value.is_empty() && first_role == Some(role.as_str()) && self.model.last_key() == Some(&key) {
			let appended = self.append_group()?;
			debug!("Appended group {} after the last one was filled in.", appended);
		}
		Ok(())
	}

	fn on_click(&mut self, target: &Element) -> Result<(), FormError> {
		let action = match target.closest(&format!("[{ACTION_ATTRIBUTE}]"))? {
			Some(element) => element.get_attribute(ACTION_ATTRIBUTE).unwrap_or_default(),
			None => return Ok(()),
		};
		if action == "add" {
			return self.append_group().map(drop);
		}
		let key: GroupKey = match target.closest(&format!("[{KEY_ATTRIBUTE}]"))?.and_then(|root| root.get_attribute(KEY_ATTRIBUTE)) {
			Some(key) => key.parse()?,
			None => return Err(FormError::Validation(format!("{action:?} control outside of a group"))),
		};
		match action.as_str() {
			"remove" => self.remove_group(&key),
			"activate" => self.set_active(&key),
			other => {
				warn!("Unknown action {:?}", other);
				Ok(())
			}
		}
	}
}
