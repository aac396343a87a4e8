//! Fills a name field from an identifier lookup service (ORCID-style), given the identifier typed into another field.
//!
//! Lookups are fire-and-forget: the response updates the target field whenever it arrives.
//! Overlapping lookups are neither cancelled nor coalesced, so the last response to arrive wins.

use crate::{error::FormError, logging::shown};
use core::future::Future;
use serde::Deserialize;
use tracing::{debug, error, instrument, trace_span, warn, Instrument};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, HtmlInputElement, Response};

const PENDING_CLASS: &str = "alert-info";
const ERROR_CLASS: &str = "alert-error";

/// Substitutes the percent-encoded `query` for the last `?` of `template`.
///
/// `https://example.org/v1/?/person.json` with `0000-0001` becomes `https://example.org/v1/0000-0001/person.json`.
#[must_use]
pub fn lookup_url(template: &str, query: &str) -> String {
	match template.rsplit_once('?') {
		Some((prefix, suffix)) => format!("{prefix}{}{suffix}", urlencoding::encode(query)),
		None => format!("{}{template}", urlencoding::encode(query)),
	}
}

#[derive(Debug, Deserialize)]
struct Record {
	#[serde(rename = "first-name")]
	first_name: Option<String>,
	#[serde(rename = "family-name")]
	family_name: Option<String>,
}

/// Extracts `"first family"` from a lookup response.
///
/// Records missing either part, or with both parts empty, are skipped. The last usable record wins.
pub fn parse_response(body: &str) -> Result<String, FormError> {
	let records: Vec<Record> = serde_json::from_str(body).map_err(|error| FormError::LookupFailure(format!("malformed response: {error}")))?;
	records
		.into_iter()
		.filter_map(|record| match (record.first_name, record.family_name) {
			(Some(first), Some(family)) if !(first.is_empty() && family.is_empty()) => Some(format!("{first} {family}").trim().to_owned()),
			_ => None,
		})
		.last()
		.ok_or_else(|| FormError::LookupFailure("no record with a name".to_owned()))
}

/// Which field a failed lookup marks as erroneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blame {
	/// The service answered with records lacking name fields, which it does for unknown identifiers.
	Identifier,
	/// Anything else: transport failures, malformed bodies, records with empty names.
	Target,
}

/// Assigns a failed response `body` to the field that gets marked.
#[must_use]
pub fn blame(body: &str) -> Blame {
	match serde_json::from_str::<Vec<Record>>(body) {
		Ok(records) if records.iter().any(|record| record.first_name.is_none() || record.family_name.is_none()) => Blame::Identifier,
		_ => Blame::Target,
	}
}

async fn fetch_text(url: &str) -> Result<String, FormError> {
	let window = web_sys::window().ok_or_else(|| FormError::LookupFailure("no window".to_owned()))?;
	let response: Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
	if !response.ok() {
		return Err(FormError::LookupFailure(format!("HTTP status {}", response.status())));
	}
	let text = JsFuture::from(response.text()?).await?;
	text.as_string().ok_or_else(|| FormError::LookupFailure("response body is not text".to_owned()))
}

/// Form group wrapping an input, which carries the pending and error styling.
fn container(input: &Element) -> Option<Element> {
	input.parent_element()?.parent_element()
}

fn set_class(input: &Element, class: &str, on: bool) {
	if let Some(container) = container(input) {
		if let Err(error) = container.class_list().toggle_with_force(class, on) {
			error!("Failed to toggle {:?}: {:?}", class, error);
		}
	}
}

/// Options of an autofill button, usually read from its `data-module-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutofillOptions {
	/// Name of the identifier input.
	pub from: String,
	/// Name of the input to fill.
	pub to: String,
	/// Lookup URL template, see [`lookup_url`].
	pub source: String,
}

fn input_named(name: &str) -> Option<HtmlInputElement> {
	let document = web_sys::window()?.document()?;
	let selector = format!("[name=\"{name}\"]");
	match document.query_selector(&selector) {
		Ok(element) => element?.dyn_into().ok(),
		Err(error) => {
			error!("Invalid selector {:?}: {:?}", selector, error);
			None
		}
	}
}

/// Marks the target field as pending and returns the request, which settles the target's styling once it completes.
///
/// Returns [`None`] if there is nothing to look up. An empty identifier marks the identifier field as erroneous instead.
pub fn begin_lookup(options: &AutofillOptions) -> Option<impl Future<Output = ()>> {
	let (from, to) = match (input_named(&options.from), input_named(&options.to)) {
		(Some(from), Some(to)) => (from, to),
		_ => {
			warn!("Autofill inputs {:?} -> {:?} not found.", options.from, options.to);
			return None;
		}
	};
	let query = from.value();
	if query.is_empty() {
		set_class(&from, ERROR_CLASS, true);
		return None;
	}

	set_class(&to, PENDING_CLASS, true);
	let url = lookup_url(&options.source, &query);
	debug!("Looking up {}", shown(&url));
	Some(async move {
		let outcome = match fetch_text(&url).await {
			Ok(body) => parse_response(&body).map_err(|error| (error, blame(&body))),
			Err(error) => Err((error, Blame::Target)),
		};
		match outcome {
			Ok(name) => {
				debug!("Lookup resolved to {}", shown(&name));
				to.set_value(&name);
				set_class(&from, ERROR_CLASS, false);
			}
			Err((error, blamed)) => {
				warn!("{}", error);
				let field = match blamed {
					Blame::Identifier => &from,
					Blame::Target => &to,
				};
				set_class(field, ERROR_CLASS, true);
			}
		}
		set_class(&to, PENDING_CLASS, false);
	})
}

/// Starts one lookup in the background. The inputs are looked up by name at call time.
#[instrument]
pub fn lookup(options: &AutofillOptions) {
	if let Some(request) = begin_lookup(options) {
		spawn_local(request.instrument(trace_span!("autofill response", to = options.to.as_str())));
	}
}

/// A click listener that runs [`lookup`]. Removed from the button on drop.
pub struct AutofillBinding {
	button: Element,
	handler: Closure<dyn Fn()>,
}

impl AutofillBinding {
	pub fn new(button: Element, options: AutofillOptions) -> Result<Self, FormError> {
		let handler = Closure::wrap(Box::new(move || lookup(&options)) as Box<dyn Fn()>);
		button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
		Ok(Self { button, handler })
	}

	/// Reads [`AutofillOptions`] from the button's `data-module-*` attributes.
	pub fn from_element(button: Element) -> Result<Self, FormError> {
		let options = crate::options::from_element(&button)?;
		Self::new(button, options)
	}
}

impl Drop for AutofillBinding {
	fn drop(&mut self) {
		if let Err(error) = self.button.remove_event_listener_with_callback("click", self.handler.as_ref().unchecked_ref()) {
			error!("Failed to remove autofill listener: {:?}", error);
		}
	}
}

impl core::fmt::Debug for AutofillBinding {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("AutofillBinding").field("button", &self.button).finish_non_exhaustive()
	}
}
