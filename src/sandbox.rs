//! In-memory publish/subscribe between independently initialized widgets on one page.

use core::{
	cell::RefCell,
	fmt::{self, Debug},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Date/time pickers announce their combined value here.
pub const DATETIME_UPDATE: &str = "kata-datetimepicker-update";
/// Date/time pickers and range checks report validation state here.
pub const DATETIME_ERROR: &str = "kata-datetimepicker-error";

/// Which validation a [`Message::Error`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
	ValidDate,
	Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
	Update { name: String, value: String },
	Error { name: String, error: bool, check: Check },
	/// Earliest selectable date, published on the channel named after the `_end` field.
	Min(Option<String>),
	/// Latest selectable date, published on the channel named after the `_begin` field.
	Max(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Message)>;

#[derive(Default)]
struct Channels {
	next_id: u64,
	subscribers: HashMap<String, Vec<(SubscriptionId, Handler)>>,
}

/// A cheaply cloneable handle to a set of named channels.
#[derive(Clone, Default)]
pub struct Sandbox(Rc<RefCell<Channels>>);

thread_local! {
	static PAGE: Sandbox = Sandbox::new();
}

impl Sandbox {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The sandbox shared by all widgets of the current page.
	#[must_use]
	pub fn page() -> Self {
		PAGE.with(Clone::clone)
	}

	pub fn subscribe(&self, channel: &str, handler: impl 'static + Fn(&Message)) -> SubscriptionId {
		let mut channels = self.0.borrow_mut();
		let id = SubscriptionId(channels.next_id);
		channels.next_id += 1;
		let handler: Handler = Rc::new(handler);
		channels.subscribers.entry(channel.to_owned()).or_default().push((id, handler));
		trace!("Subscribed {:?} to {:?}", id, channel);
		id
	}

	/// Returns whether the subscription existed.
	pub fn unsubscribe(&self, channel: &str, id: SubscriptionId) -> bool {
		let mut channels = self.0.borrow_mut();
		let Some(subscribers) = channels.subscribers.get_mut(channel) else {
			return false;
		};
		let before = subscribers.len();
		subscribers.retain(|(subscribed, _)| *subscribed != id);
		let removed = subscribers.len() != before;
		if subscribers.is_empty() {
			channels.subscribers.remove(channel);
		}
		removed
	}

	/// Delivers `message` to everyone subscribed to `channel` at the time of the call and returns how many that were.
	///
	/// Handlers may publish, subscribe or unsubscribe themselves.
	pub fn publish(&self, channel: &str, message: &Message) -> usize {
		let span = trace_span!("publish", channel, ?message);
		let _enter = span.enter();
		let handlers: Vec<Handler> = match self.0.borrow().subscribers.get(channel) {
			Some(subscribers) => subscribers.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
			None => return 0,
		};
		for handler in &handlers {
			handler(message);
		}
		handlers.len()
	}

	#[must_use]
	pub fn subscriber_count(&self, channel: &str) -> usize {
		self.0.borrow().subscribers.get(channel).map_or(0, Vec::len)
	}
}

impl Debug for Sandbox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let channels = self.0.borrow();
		f.debug_map().entries(channels.subscribers.iter().map(|(channel, subscribers)| (channel, subscribers.len()))).finish()
	}
}
