#![doc(html_root_url = "https://docs.rs/kata-form-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! Client-side state of repeatable form fields, kept in sync with the DOM and with the names a plain form POST submits.
//!
//! The browser-independent parts ([`model`], [`name`], [`options`], [`sandbox`], [`datetime`], [`range`], [`toggle`], [`pager`])
//! work anywhere. [`sync::DomSynchronizer`] and the bindings in [`autofill`] and [`toggle`] need a browser.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod autofill;
pub mod datetime;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod name;
pub mod options;
pub mod pager;
pub mod range;
pub mod sandbox;
pub mod sync;
pub mod toggle;

pub use error::FormError;
pub use model::{FieldGroup, GroupKey, RepeatableGroupModel};
pub use sync::DomSynchronizer;
