//! Console logging and redaction of user-entered values.

/// Replaces form values in log output unless the `dangerous-logging` feature is enabled.
#[must_use]
pub fn shown(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"<redacted>"
	}
}

/// Sets `tracing-wasm` as the global subscriber, so events show up in the browser console.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "console-log")]
pub fn install() -> bool {
	tracing_wasm::try_set_as_global_default().is_ok()
}
