use kata_form_dom::{
	datetime::{self, DateTimeValue, PickerBounds},
	sandbox::{Check, Message, Sandbox, DATETIME_ERROR, DATETIME_UPDATE},
};
use std::{cell::RefCell, rc::Rc};
use time::macros::datetime;

#[test]
fn partial_dates_denote_their_earliest_instant() {
	assert_eq!(datetime::earliest_instant("2020"), Some(datetime!(2020-01-01 0:00 UTC)));
	assert_eq!(datetime::earliest_instant("2020-05"), Some(datetime!(2020-05-01 0:00 UTC)));
	assert_eq!(datetime::earliest_instant("2020-05-01T12"), Some(datetime!(2020-05-01 12:00 UTC)));
	assert_eq!(datetime::earliest_instant("2020-05-01T12:00+03:00"), Some(datetime!(2020-05-01 9:00 UTC)));
	assert_eq!(datetime::earliest_instant("2020-05-01T12:00:30-02:30"), Some(datetime!(2020-05-01 14:30:30 UTC)));
}

#[test]
fn validation() {
	for valid in ["", "2020", "2020-02-29", "2020-05-01T12:30", "2020-05-01T12:30:00Z", "1999-12-31T23:59:59+14:00"] {
		assert!(datetime::validate(valid), "{}", valid);
	}
	for invalid in ["abc", "20", "2021-02-29", "2020-13", "2020-05-01T25:00", "2020-05-01 12:00", "2020-05-01T12:00+3"] {
		assert!(!datetime::validate(invalid), "{}", invalid);
	}
}

#[test]
fn combined_value() {
	let mut value = DateTimeValue {
		date: "2020-05-01".to_owned(),
		..DateTimeValue::default()
	};
	assert_eq!(value.combined(), "2020-05-01");

	value.use_time = true;
	assert_eq!(value.combined(), "2020-05-01T00:00:00Z");

	value.time = "12:30".to_owned();
	value.tz = "+02:00".to_owned();
	assert_eq!(value.combined(), "2020-05-01T12:30+02:00");
	assert!(value.is_valid());

	value.date = String::new();
	assert_eq!(value.combined(), "");
	assert!(value.is_valid());
}

#[test]
fn initial_values() {
	assert_eq!(
		DateTimeValue::parse_initial("2020-05-01T12:30:00+02:00").unwrap(),
		DateTimeValue {
			date: "2020-05-01".to_owned(),
			time: "12:30:00".to_owned(),
			tz: "+02:00".to_owned(),
			use_time: true,
		}
	);
	assert_eq!(
		DateTimeValue::parse_initial("2020-05-01").unwrap(),
		DateTimeValue {
			date: "2020-05-01".to_owned(),
			..DateTimeValue::default()
		}
	);
	let utc = DateTimeValue::parse_initial("2020-05-01T08:00").unwrap();
	assert_eq!(utc.tz, "Z");
	assert!(utc.use_time);
	assert!(DateTimeValue::parse_initial("").is_err());
}

#[test]
fn bounds_use_full_dates() {
	assert_eq!(datetime::bound_date("2020"), "2020-01-01");
	assert_eq!(datetime::bound_date("2020-05"), "2020-05-01");
	assert_eq!(datetime::bound_date("2020-05-07T12:00Z"), "2020-05-07");

	let mut bounds = PickerBounds::default();
	assert!(bounds.apply(&Message::Min(Some("2020-05-07T12:00Z".to_owned()))));
	assert!(bounds.apply(&Message::Max(Some("2021".to_owned()))));
	assert_eq!(bounds.start.as_deref(), Some("2020-05-07"));
	assert_eq!(bounds.end.as_deref(), Some("2021-01-01"));

	assert!(bounds.apply(&Message::Min(Some(String::new()))));
	assert_eq!(bounds.start, None);
	assert!(!bounds.apply(&Message::Update {
		name: "x".to_owned(),
		value: "2020".to_owned(),
	}));
	assert_eq!(bounds.end.as_deref(), Some("2021-01-01"));
}

#[test]
fn placeholder() {
	assert_eq!(datetime::date_placeholder("fi"), "vvvv-kk-pp");
	assert_eq!(datetime::date_placeholder("en"), "yyyy-mm-dd");
}

#[test]
fn publish_reports_validity_before_the_value() {
	let sandbox = Sandbox::new();
	let log = Rc::new(RefCell::new(Vec::new()));
	for channel in [DATETIME_ERROR, DATETIME_UPDATE] {
		let log = Rc::clone(&log);
		sandbox.subscribe(channel, move |message| log.borrow_mut().push(message.clone()));
	}

	let value = DateTimeValue {
		date: "2021-02-29".to_owned(),
		..DateTimeValue::default()
	};
	assert_eq!(value.publish("temporal_coverage_begin", &sandbox), "2021-02-29");
	assert_eq!(
		*log.borrow(),
		vec![
			Message::Error {
				name: "temporal_coverage_begin".to_owned(),
				error: true,
				check: Check::ValidDate,
			},
			Message::Update {
				name: "temporal_coverage_begin".to_owned(),
				value: "2021-02-29".to_owned(),
			},
		]
	);
}

#[test]
fn every_offered_time_zone_validates() {
	assert_eq!(datetime::TIMEZONES.iter().filter(|&&tz| tz == "Z").count(), 1);
	for tz in datetime::TIMEZONES {
		let value = DateTimeValue {
			date: "2020-05-01".to_owned(),
			time: "12:00".to_owned(),
			tz: tz.to_owned(),
			use_time: true,
		};
		assert!(value.is_valid(), "{}", value.combined());
	}
}
