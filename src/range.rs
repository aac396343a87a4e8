//! Temporal coverage: a begin and an end picker that must form a valid range.
//!
//! Fields are paired by name, `temporal_coverage_begin` with `temporal_coverage_end`.
//! While the pair is out of order neither hidden input is written; both are written once it's corrected.

use crate::{
	datetime::{earliest_instant, validate},
	sandbox::{Check, Message, Sandbox, SubscriptionId, DATETIME_ERROR, DATETIME_UPDATE},
};
use core::cell::RefCell;
use indexmap::IndexMap;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace, warn};

const BEGIN: &str = "_begin";
const END: &str = "_end";
const FIELD_PREFIX: &str = "temporal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
	Begin,
	End,
}

/// Which end of a range `name` is, and the name of the opposite end.
#[must_use]
pub fn counterpart(name: &str) -> Option<(Side, String)> {
	if name.contains(BEGIN) {
		Some((Side::Begin, name.replacen(BEGIN, END, 1)))
	} else if name.contains(END) {
		Some((Side::End, name.replacen(END, BEGIN, 1)))
	} else {
		None
	}
}

/// Inline error text for `check` failing on field `name`, in Finnish for `fi` and English otherwise.
#[must_use]
pub fn error_message(lang: &str, name: &str, check: Check) -> String {
	let fi = lang == "fi";
	if check == Check::Range {
		let text = if fi { "Loppu pitää olla alun jälkeen" } else { "End must be after the starting time" };
		return text.to_owned();
	}
	let side = match (name.contains(BEGIN), fi) {
		(true, true) => "Alku",
		(true, false) => "Begin",
		(false, true) => "Loppu",
		(false, false) => "End",
	};
	let text = if fi { "Päivämäärä/aika ei ole kelvollinen" } else { "Date/time is not valid" };
	format!("{side}: {text}")
}

/// What the page should do after a value update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeOutcome {
	/// Bound for the opposite picker: `(channel, message)`.
	pub bound: Option<(String, Message)>,
	/// The range check result, for [`DATETIME_ERROR`].
	pub report: Option<Message>,
	/// Hidden inputs to write, as `(name, value)`.
	pub commit: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct TemporalCoverage {
	lang: String,
	values: IndexMap<String, String>,
	dates_valid: bool,
	messages: IndexMap<(String, Check), String>,
}

impl TemporalCoverage {
	#[must_use]
	pub fn new(lang: &str) -> Self {
		Self {
			lang: lang.to_owned(),
			values: IndexMap::new(),
			dates_valid: true,
			messages: IndexMap::new(),
		}
	}

	/// Records a validation result. Results for fields outside the temporal coverage pair are ignored.
	pub fn on_error(&mut self, name: &str, error: bool, check: Check) {
		if !name.starts_with(FIELD_PREFIX) {
			return;
		}
		if check == Check::ValidDate {
			self.dates_valid = !error;
		}
		let slot = (name.to_owned(), check);
		if error {
			let message = error_message(&self.lang, name, check);
			debug!("Range error on {}: {}", name, message);
			self.messages.insert(slot, message);
		} else {
			self.messages.shift_remove(&slot);
		}
	}

	#[instrument(skip(self, value), fields(value = crate::logging::shown(value)))]
	pub fn on_update(&mut self, name: &str, value: &str) -> RangeOutcome {
		let mut outcome = RangeOutcome::default();
		if !self.dates_valid || name.is_empty() {
			trace!("Ignoring update while a date is invalid.");
			return outcome;
		}
		if !validate(value) {
			warn!("Ignoring malformed date/time update for {}.", name);
			return outcome;
		}
		self.values.insert(name.to_owned(), value.to_owned());

		let Some((side, other)) = counterpart(name) else {
			outcome.commit.push((name.to_owned(), value.to_owned()));
			return outcome;
		};
		outcome.bound = Some(match side {
			Side::Begin => (other.clone(), Message::Min(Some(value.to_owned()))),
			Side::End => (other.clone(), Message::Max(Some(value.to_owned()))),
		});

		let other_value = self.values.get(&other).filter(|v| !v.is_empty()).cloned();
		let error = match (value, other_value.as_deref()) {
			("", _) | (_, None) => false,
			(current, Some(other_value)) => match (earliest_instant(current), earliest_instant(other_value)) {
				(Some(current), Some(other_value)) => match side {
					Side::Begin => current > other_value,
					Side::End => current < other_value,
				},
				_ => false,
			},
		};
		self.on_error(name, error, Check::Range);
		// A fix from either side clears the error reported for the other one.
		if !error {
			self.on_error(&other, false, Check::Range);
		}
		outcome.report = Some(Message::Error {
			name: name.to_owned(),
			error,
			check: Check::Range,
		});
		if !error {
			outcome.commit.push((name.to_owned(), value.to_owned()));
			if let Some(other_value) = self.values.get(&other) {
				outcome.commit.push((other, other_value.clone()));
			}
		}
		outcome
	}

	pub fn messages(&self) -> impl Iterator<Item = &str> {
		self.messages.values().map(String::as_str)
	}

	#[must_use]
	pub fn has_errors(&self) -> bool {
		!self.messages.is_empty()
	}

	/// Subscribes to the picker channels of `sandbox`. `commit` receives the hidden inputs to write.
	///
	/// The subscriptions end when the returned binding is dropped.
	pub fn bind(self, sandbox: &Sandbox, commit: impl 'static + Fn(&str, &str)) -> CoverageBinding {
		let coverage = Rc::new(RefCell::new(self));

		let update = {
			let coverage = Rc::downgrade(&coverage);
			let publisher = sandbox.clone();
			sandbox.subscribe(DATETIME_UPDATE, move |message| {
				let Message::Update { name, value } = message else {
					return;
				};
				let Some(outcome) = with_coverage(&coverage, |coverage| coverage.on_update(name, value)) else {
					return;
				};
				// The borrow is released here, so subscribers (including this coverage) may react.
				if let Some((channel, bound)) = &outcome.bound {
					publisher.publish(channel, bound);
				}
				if let Some(report) = &outcome.report {
					publisher.publish(DATETIME_ERROR, report);
				}
				for (name, value) in &outcome.commit {
					commit(name, value);
				}
			})
		};

		let error = {
			let coverage = Rc::downgrade(&coverage);
			sandbox.subscribe(DATETIME_ERROR, move |message| {
				if let Message::Error { name, error, check } = message {
					with_coverage(&coverage, |coverage| coverage.on_error(name, *error, *check));
				}
			})
		};

		CoverageBinding {
			coverage,
			sandbox: sandbox.clone(),
			update,
			error,
		}
	}
}

fn with_coverage<T>(coverage: &Weak<RefCell<TemporalCoverage>>, f: impl FnOnce(&mut TemporalCoverage) -> T) -> Option<T> {
	let coverage = coverage.upgrade()?;
	let result = match coverage.try_borrow_mut() {
		Ok(mut coverage) => Some(f(&mut coverage)),
		Err(_) => {
			warn!("Temporal coverage is busy; dropping re-entrant message.");
			None
		}
	};
	result
}

/// A [`TemporalCoverage`] subscribed to a [`Sandbox`].
#[derive(Debug)]
pub struct CoverageBinding {
	coverage: Rc<RefCell<TemporalCoverage>>,
	sandbox: Sandbox,
	update: SubscriptionId,
	error: SubscriptionId,
}

impl CoverageBinding {
	#[must_use]
	pub fn messages(&self) -> Vec<String> {
		self.coverage.borrow().messages().map(str::to_owned).collect()
	}

	#[must_use]
	pub fn has_errors(&self) -> bool {
		self.coverage.borrow().has_errors()
	}
}

impl Drop for CoverageBinding {
	fn drop(&mut self) {
		self.sandbox.unsubscribe(DATETIME_UPDATE, self.update);
		self.sandbox.unsubscribe(DATETIME_ERROR, self.error);
	}
}
