use kata_form_dom::{
	range::{self, Side, TemporalCoverage},
	sandbox::{Check, Message, Sandbox, DATETIME_ERROR, DATETIME_UPDATE},
};
use std::{cell::RefCell, rc::Rc};

const BEGIN: &str = "temporal_coverage_begin";
const END: &str = "temporal_coverage_end";

fn pair(begin: &str, end: &str) -> Vec<(String, String)> {
	vec![(BEGIN.to_owned(), begin.to_owned()), (END.to_owned(), end.to_owned())]
}

#[test]
fn counterparts() {
	assert_eq!(range::counterpart(BEGIN), Some((Side::Begin, END.to_owned())));
	assert_eq!(range::counterpart(END), Some((Side::End, BEGIN.to_owned())));
	assert_eq!(range::counterpart("temporal_coverage"), None);
}

#[test]
fn error_messages() {
	assert_eq!(range::error_message("en", BEGIN, Check::ValidDate), "Begin: Date/time is not valid");
	assert_eq!(range::error_message("fi", END, Check::ValidDate), "Loppu: Päivämäärä/aika ei ole kelvollinen");
	assert_eq!(range::error_message("en", END, Check::Range), "End must be after the starting time");
	assert_eq!(range::error_message("fi", BEGIN, Check::Range), "Loppu pitää olla alun jälkeen");
}

#[test]
fn reversed_range_writes_nothing_until_corrected() {
	let mut coverage = TemporalCoverage::new("en");

	let first = coverage.on_update(BEGIN, "2020-05-01");
	assert_eq!(first.bound, Some((END.to_owned(), Message::Min(Some("2020-05-01".to_owned())))));
	assert_eq!(first.commit, vec![(BEGIN.to_owned(), "2020-05-01".to_owned())]);

	let reversed = coverage.on_update(END, "2020-04-01");
	assert_eq!(reversed.bound, Some((BEGIN.to_owned(), Message::Max(Some("2020-04-01".to_owned())))));
	assert_eq!(
		reversed.report,
		Some(Message::Error {
			name: END.to_owned(),
			error: true,
			check: Check::Range,
		})
	);
	assert!(reversed.commit.is_empty());
	assert!(coverage.has_errors());
	assert_eq!(coverage.messages().collect::<Vec<_>>(), vec!["End must be after the starting time"]);

	let fixed = coverage.on_update(END, "2020-06-01");
	assert_eq!(fixed.commit, vec![(END.to_owned(), "2020-06-01".to_owned()), (BEGIN.to_owned(), "2020-05-01".to_owned())]);
	assert!(!coverage.has_errors());
}

#[test]
fn correcting_the_other_side_clears_the_error() {
	let mut coverage = TemporalCoverage::new("en");
	coverage.on_update(END, "2020-04-01");
	assert!(coverage.on_update(BEGIN, "2020-05-01").commit.is_empty());
	assert!(coverage.has_errors());

	let fixed = coverage.on_update(BEGIN, "2020-03-01");
	assert_eq!(fixed.commit, vec![(BEGIN.to_owned(), "2020-03-01".to_owned()), (END.to_owned(), "2020-04-01".to_owned())]);
	assert!(!coverage.has_errors());
}

#[test]
fn equal_ends_and_offsets() {
	let mut coverage = TemporalCoverage::new("en");
	coverage.on_update(BEGIN, "2020-05-01T12:00+03:00");
	// 10:00Z is after 09:00Z even though the local hour is earlier.
	assert!(!coverage.on_update(END, "2020-05-01T10:00Z").commit.is_empty());
	assert!(!coverage.has_errors());

	let mut coverage = TemporalCoverage::new("en");
	coverage.on_update(BEGIN, "2020-05-01");
	assert_eq!(coverage.on_update(END, "2020-05-01").commit, pair("2020-05-01", "2020-05-01").into_iter().rev().collect::<Vec<_>>());
}

#[test]
fn invalid_dates_suspend_range_checks() {
	let mut coverage = TemporalCoverage::new("fi");
	coverage.on_error(BEGIN, true, Check::ValidDate);
	assert_eq!(coverage.messages().collect::<Vec<_>>(), vec!["Alku: Päivämäärä/aika ei ole kelvollinen"]);
	assert_eq!(coverage.on_update(END, "2020-04-01"), range::RangeOutcome::default());

	coverage.on_error(BEGIN, false, Check::ValidDate);
	assert!(!coverage.has_errors());
	assert!(!coverage.on_update(END, "2020-04-01").commit.is_empty());
}

#[test]
fn unrelated_fields_are_ignored() {
	let mut coverage = TemporalCoverage::new("en");
	coverage.on_error("issued", true, Check::ValidDate);
	assert!(!coverage.has_errors());
	assert_eq!(coverage.on_update("issued", "not a date"), range::RangeOutcome::default());
	assert_eq!(coverage.on_update("issued", "2020-01-01").commit, vec![("issued".to_owned(), "2020-01-01".to_owned())]);
}

#[test]
fn bound_coverage_follows_the_sandbox() {
	let sandbox = Sandbox::new();
	let written = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&written);
	let binding = TemporalCoverage::new("en").bind(&sandbox, move |name, value| sink.borrow_mut().push((name.to_owned(), value.to_owned())));

	let min = Rc::new(RefCell::new(Vec::new()));
	let min_sink = Rc::clone(&min);
	sandbox.subscribe(END, move |message| min_sink.borrow_mut().push(message.clone()));

	let update = |name: &str, value: &str| {
		sandbox.publish(
			DATETIME_UPDATE,
			&Message::Update {
				name: name.to_owned(),
				value: value.to_owned(),
			},
		)
	};

	update(BEGIN, "2020-05-01");
	update(END, "2020-04-01");
	assert!(binding.has_errors());
	assert_eq!(*written.borrow(), vec![(BEGIN.to_owned(), "2020-05-01".to_owned())]);
	assert_eq!(*min.borrow(), vec![Message::Min(Some("2020-05-01".to_owned()))]);

	update(END, "2020-06-01");
	assert!(!binding.has_errors());
	assert!(binding.messages().is_empty());
	assert_eq!(written.borrow()[1..], pair("2020-05-01", "2020-06-01").into_iter().rev().collect::<Vec<_>>()[..]);

	drop(binding);
	assert_eq!(sandbox.subscriber_count(DATETIME_UPDATE), 0);
	assert_eq!(sandbox.subscriber_count(DATETIME_ERROR), 0);
}
