//! Value model of the combined date + optional time & time zone picker.
//!
//! The picker's visible inputs feed a [`DateTimeValue`]; its [`combined`](`DateTimeValue::combined`) ISO 8601 form is what lands in the hidden, submitted input.

use crate::{
	error::FormError,
	sandbox::{Check, Message, Sandbox, DATETIME_ERROR, DATETIME_UPDATE},
};
use regex::Regex;
use std::sync::OnceLock;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::{instrument, trace};

/// Offsets offered by the time zone selector, in display order.
pub const TIMEZONES: [&str; 40] = [
	"-12:00", "-11:00", "-10:00", "-09:30", "-09:00", "-08:00", "-07:00", "-06:00", "-05:00", "-04:30", "-04:00", "-03:30", "-03:00", "-02:00", "-01:00", "Z", "+01:00", "+02:00", "+03:00", "+03:30",
	"+04:00", "+04:30", "+05:00", "+05:30", "+05:45", "+06:00", "+06:30", "+07:00", "+08:00", "+08:45", "+09:00", "+09:30", "+10:00", "+10:30", "+11:00", "+11:30", "+12:00", "+12:45", "+13:00", "+14:00",
];

fn iso_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| {
		Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2}))?)?(Z|[+-]\d{2}:\d{2})?)?)?)?$").expect("valid ISO 8601 pattern")
	})
}

fn initial_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	PATTERN.get_or_init(|| Regex::new(r"^([^T]+)(T([0-9:]+)(Z|[-+0-9:]+)?)?$").expect("valid initial value pattern"))
}

/// The earliest instant a (possibly partial) ISO 8601 date/time denotes.
///
/// Missing parts default to their first value; a missing offset is read as UTC.
/// Returns [`None`] for text that doesn't match the accepted format or names no real calendar date/time.
#[must_use]
pub fn earliest_instant(datetime: &str) -> Option<OffsetDateTime> {
	let captures = iso_pattern().captures(datetime)?;
	let number = |i: usize, default: u8| -> Option<u8> { captures.get(i).map_or(Some(default), |m| m.as_str().parse().ok()) };

	let year: i32 = captures.get(1)?.as_str().parse().ok()?;
	let month = Month::try_from(number(2, 1)?).ok()?;
	let date = Date::from_calendar_date(year, month, number(3, 1)?).ok()?;
	let time = Time::from_hms(number(4, 0)?, number(5, 0)?, number(6, 0)?).ok()?;
	let offset = match captures.get(7).map(|m| m.as_str()) {
		None | Some("Z") => UtcOffset::UTC,
		Some(offset) => {
			let sign: i8 = if offset.starts_with('-') { -1 } else { 1 };
			let hours: i8 = offset.get(1..3)?.parse().ok()?;
			let minutes: i8 = offset.get(4..6)?.parse().ok()?;
			UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()?
		}
	};
	Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// Empty input is valid; anything else must be well-formed ISO 8601 naming a real date/time.
#[must_use]
pub fn validate(datetime: &str) -> bool {
	datetime.is_empty() || earliest_instant(datetime).is_some()
}

/// Reduces a date/time to the full `yyyy-mm-dd` date a picker can use as a bound.
#[must_use]
pub fn bound_date(value: &str) -> String {
	let mut date: String = value.chars().take(10).collect();
	while date.len() < 10 {
		date.push_str("-01");
	}
	date
}

#[must_use]
pub fn date_placeholder(lang: &str) -> &'static str {
	if lang == "fi" {
		"vvvv-kk-pp"
	} else {
		"yyyy-mm-dd"
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeValue {
	pub date: String,
	pub time: String,
	pub tz: String,
	pub use_time: bool,
}

impl Default for DateTimeValue {
	fn default() -> Self {
		Self {
			date: String::new(),
			time: String::new(),
			tz: "Z".to_owned(),
			use_time: false,
		}
	}
}

impl DateTimeValue {
	/// Splits a server-rendered value into the picker's parts. Time is enabled iff the value has a time part.
	pub fn parse_initial(value: &str) -> Result<Self, FormError> {
		let captures = initial_pattern().captures(value).ok_or_else(|| FormError::Validation(format!("unrecognized date/time {value:?}")))?;
		let part = |i: usize| captures.get(i).map_or("", |m| m.as_str());
		Ok(Self {
			date: part(1).to_owned(),
			time: part(3).to_owned(),
			tz: match part(4) {
				"" => "Z".to_owned(),
				tz => tz.to_owned(),
			},
			use_time: captures.get(2).is_some(),
		})
	}

	/// The value written to the hidden input.
	#[must_use]
	pub fn combined(&self) -> String {
		let mut combined = self.date.clone();
		if self.use_time && !combined.is_empty() {
			combined.push('T');
			combined.push_str(if self.time.is_empty() { "00:00:00" } else { &self.time });
			combined.push_str(if self.tz.is_empty() { "Z" } else { &self.tz });
		}
		combined
	}

	#[must_use]
	pub fn is_valid(&self) -> bool {
		validate(&self.combined())
	}

	/// Announces the current value of the picker for field `name`: its validity, then the value itself.
	#[instrument(skip(self, sandbox))]
	pub fn publish(&self, name: &str, sandbox: &Sandbox) -> String {
		let combined = self.combined();
		let error = !validate(&combined);
		trace!(error, "Publishing picker value.");
		sandbox.publish(
			DATETIME_ERROR,
			&Message::Error {
				name: name.to_owned(),
				error,
				check: Check::ValidDate,
			},
		);
		sandbox.publish(
			DATETIME_UPDATE,
			&Message::Update {
				name: name.to_owned(),
				value: combined.clone(),
			},
		);
		combined
	}
}

/// Selectable range of one picker, adjusted through [`Message::Min`] and [`Message::Max`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerBounds {
	pub start: Option<String>,
	pub end: Option<String>,
}

impl PickerBounds {
	/// Returns whether `message` was a bound message.
	pub fn apply(&mut self, message: &Message) -> bool {
		match message {
			Message::Min(min) => self.start = min.as_deref().filter(|min| !min.is_empty()).map(bound_date),
			Message::Max(max) => self.end = max.as_deref().filter(|max| !max.is_empty()).map(bound_date),
			Message::Update { .. } | Message::Error { .. } => return false,
		}
		true
	}
}
