//! Conditional visibility of form sections, as pure functions of the controlling choice.
//!
//! [`AccessToggle`] is the thin binding that applies them to the page.

use crate::error::FormError;
use core::{
	fmt::{self, Debug},
	str::FromStr,
};
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Element, HtmlElement};

/// How a dataset's data can be accessed, as chosen with the access radio buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
	AccessApplication,
	DirectDownload,
	AccessRequest,
	ContactOwner,
}

impl AccessType {
	/// The radio button id, which is also the submitted value.
	#[must_use]
	pub fn id(self) -> &'static str {
		match self {
			Self::AccessApplication => "access_application",
			Self::DirectDownload => "direct_download",
			Self::AccessRequest => "access_request",
			Self::ContactOwner => "contact_owner",
		}
	}
}

impl FromStr for AccessType {
	type Err = FormError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"access_application" => Self::AccessApplication,
			"direct_download" => Self::DirectDownload,
			"access_request" => Self::AccessRequest,
			"contact_owner" => Self::ContactOwner,
			other => return Err(FormError::Validation(format!("unknown access type {other:?}"))),
		})
	}
}

/// Which URL sections are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessVisibility {
	pub application_url: bool,
	pub request_url: bool,
	pub download_url: bool,
}

impl AccessVisibility {
	/// Section element ids with their visibility.
	#[must_use]
	pub fn sections(self) -> [(&'static str, bool); 3] {
		[
			("urlDiv_access_application", self.application_url),
			("urlDiv_access_request", self.request_url),
			("urlDiv_direct_download", self.download_url),
		]
	}
}

/// Exactly the URL section belonging to `access` is shown; contacting the owner needs none.
#[must_use]
pub fn access_visibility(access: AccessType) -> AccessVisibility {
	AccessVisibility {
		application_url: access == AccessType::AccessApplication,
		request_url: access == AccessType::AccessRequest,
		download_url: access == AccessType::DirectDownload,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageToggle {
	pub visible: bool,
	/// Hiding the section while its input holds a value loses that value on submit.
	pub warn_data_loss: bool,
}

/// Flips the visibility of the language section.
#[must_use]
pub fn toggle_language(visible: bool, has_value: bool) -> LanguageToggle {
	let visible = !visible;
	LanguageToggle {
		visible,
		warn_data_loss: has_value && !visible,
	}
}

fn apply_access(document: &web_sys::Document, access: AccessType) {
	for (id, visible) in access_visibility(access).sections() {
		match document.get_element_by_id(id).and_then(|element| element.dyn_into::<HtmlElement>().ok()) {
			Some(section) => section.set_hidden(!visible),
			None => warn!("Access section #{} not found.", id),
		}
	}
}

/// Shows the URL section matching the checked access radio inside `container`. Unbound on drop.
pub struct AccessToggle {
	container: Element,
	handler: Closure<dyn Fn(web_sys::Event)>,
}

impl AccessToggle {
	pub fn new(container: Element) -> Result<Self, FormError> {
		let document = container.owner_document().ok_or_else(|| FormError::Dom("no owner document found for the container".to_owned()))?;
		let handler = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let id = match event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
				Some(target) => target.id(),
				None => return,
			};
			match id.parse() {
				Ok(access) => {
					trace!("Access type {:?}", access);
					apply_access(&document, access);
				}
				Err(error) => trace!("Ignoring change of #{}: {}", id, error),
			}
		}) as Box<dyn Fn(web_sys::Event)>);
		container.add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())?;
		Ok(Self { container, handler })
	}
}

impl Drop for AccessToggle {
	fn drop(&mut self) {
		if let Err(error) = self.container.remove_event_listener_with_callback("change", self.handler.as_ref().unchecked_ref()) {
			error!("Failed to remove access toggle listener: {:?}", error);
		}
	}
}

impl Debug for AccessToggle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AccessToggle").field("container", &self.container).finish_non_exhaustive()
	}
}
