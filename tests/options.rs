use kata_form_dom::{
	autofill::AutofillOptions,
	options::{self, InitialValue, WidgetOptions},
	FormError, GroupKey,
};

fn attributes(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
	pairs.iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect()
}

#[test]
fn defaults() {
	let options = WidgetOptions::from_json(r#"{"name": "title"}"#).unwrap();
	assert_eq!(options.name, "title");
	assert!(options.remove);
	assert!(!options.mandatory);
	assert_eq!(options.roles, vec!["value".to_owned()]);
	assert!(options.values.is_empty());
}

#[test]
fn json_options() {
	let options = WidgetOptions::from_json(
		r#"{
			"name": "extras",
			"values": {"0": {"key": "funder", "value": "Academy of Finland"}, "1": "plain"},
			"roles": ["key", "value"],
			"keep": ["key"],
			"auto-append": true,
			"index": 2
		}"#,
	)
	.unwrap();
	assert!(options.auto_append);
	assert_eq!(options.index, Some(2));
	assert_eq!(options.values["1"], InitialValue::Single("plain".to_owned()));

	let model = options.build_model().unwrap();
	assert_eq!(model.value(&GroupKey::Index(0), "key"), Some("funder"));
	// A bare string goes to the first role; the other roles start blank.
	assert_eq!(model.value(&GroupKey::Index(1), "key"), Some("plain"));
	assert_eq!(model.value(&GroupKey::Index(1), "value"), Some(""));
	assert_eq!(model.next_index(), GroupKey::Index(2));
	assert!(!model.is_mandatory());

	assert!(matches!(WidgetOptions::from_json("{"), Err(FormError::Validation(_))));
	assert!(matches!(WidgetOptions::from_json(r#"{"mandatory": "yes"}"#), Err(FormError::Validation(_))));
}

#[test]
fn data_attributes() {
	let options = WidgetOptions::from_attributes(attributes(&[
		("class", "control-group"),
		("data-module", "kata-multilang-field"),
		("data-module-name", "title"),
		("data-module-current", "fi"),
		("data-module-mandatory", "true"),
		("data-module-values", r#"{"fin": "Otsikko", "eng": "Title"}"#),
		("data-module-hide-inactive", "true"),
	]))
	.unwrap();
	assert_eq!(options.name, "title");
	assert_eq!(options.current.as_deref(), Some("fi"));
	assert!(options.mandatory);
	assert!(options.hide_inactive);

	let model = options.build_model().unwrap();
	let fin = GroupKey::language("fin").unwrap();
	assert_eq!(model.keys().map(ToString::to_string).collect::<Vec<_>>(), vec!["fin", "eng"]);
	assert_eq!(model.active(), Some(&fin));
	assert_eq!(model.value(&fin, "value"), Some("Otsikko"));
}

#[test]
fn mandatory_fields_are_seeded() {
	let seeded = WidgetOptions::from_json(r#"{"name": "title", "mandatory": true, "current": "en"}"#).unwrap().build_model().unwrap();
	let eng = GroupKey::language("eng").unwrap();
	assert_eq!(seeded.len(), 1);
	assert_eq!(seeded.active(), Some(&eng));
	assert_eq!(seeded.value(&eng, "value"), Some(""));

	let positional = WidgetOptions::from_json(r#"{"name": "q", "mandatory": true, "index": 3}"#).unwrap().build_model().unwrap();
	assert_eq!(positional.keys().collect::<Vec<_>>(), vec![&GroupKey::Index(3)]);

	let optional = WidgetOptions::from_json(r#"{"name": "q"}"#).unwrap().build_model().unwrap();
	assert!(optional.is_empty());
}

#[test]
fn malformed_keys_are_rejected() {
	let options = WidgetOptions::from_json(r#"{"name": "title", "values": {"f_i": "x"}}"#).unwrap();
	assert!(matches!(options.build_model(), Err(FormError::Validation(_))));

	let options = WidgetOptions::from_json(r#"{"name": "title", "values": {"fi": "x", "fin": "y"}}"#).unwrap();
	assert_eq!(options.build_model().unwrap_err(), FormError::DuplicateKey(GroupKey::language("fin").unwrap()));

	let options = WidgetOptions::from_json(r#"{"name": "title", "current": "f_i", "values": {"fi": "x"}}"#).unwrap();
	assert_eq!(options.current_key(), None);
	assert_eq!(options.build_model().unwrap().active(), Some(&GroupKey::language("fin").unwrap()));
}

#[test]
fn other_option_types() {
	let autofill: AutofillOptions = options::from_attributes(attributes(&[
		("data-module-from", "orcid"),
		("data-module-to", "author__0__name"),
		("data-module-source", "/api/orcid/?"),
		("type", "button"),
	]))
	.unwrap();
	assert_eq!(
		autofill,
		AutofillOptions {
			from: "orcid".to_owned(),
			to: "author__0__name".to_owned(),
			source: "/api/orcid/?".to_owned(),
		}
	);

	let missing: Result<AutofillOptions, _> = options::from_attributes(attributes(&[("data-module-from", "orcid")]));
	assert!(matches!(missing, Err(FormError::Validation(_))));
}
