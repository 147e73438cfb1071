//! Logging macros for the bridge
//!
//! In the browser, messages go to the developer console. Everywhere else
//! they are emitted as `tracing` events under the `domglue` target, so the
//! host application decides whether and where they appear.
//!
//! | Macro | Browser | Simulated | Enabled when |
//! |-------|---------|-----------|--------------|
//! | `debug_log!` | `console.debug` | `tracing::debug!` | `debug-hooks` + `debug_assertions` |
//! | `info_log!` | `console.info` | `tracing::info!` | always |
//! | `warn_log!` | `console.warn` | `tracing::warn!` | always |
//! | `error_log!` | `console.error` | `tracing::error!` | always |
//!
//! ```ignore
//! use domglue_core::{debug_log, warn_log};
//!
//! debug_log!("marshalling {} fields", count);
//! warn_log!("listener {} threw: {}", id, message);
//! ```

/// Logs bridge internals (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", browser))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::debug_1(&format!($($arg)*).into());
	}};
}

/// Logs bridge internals (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", simulated))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::debug!(target: "domglue", $($arg)*);
	}};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs an info message
#[macro_export]
#[cfg(browser)]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::info_1(&format!($($arg)*).into());
	}};
}

/// Logs an info message
#[macro_export]
#[cfg(simulated)]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::info!(target: "domglue", $($arg)*);
	}};
}

/// Logs a warning message
///
/// Used for recoverable problems on the foreign side, such as a listener
/// throwing during dispatch.
#[macro_export]
#[cfg(browser)]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::warn_1(&format!($($arg)*).into());
	}};
}

/// Logs a warning message
#[macro_export]
#[cfg(simulated)]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::warn!(target: "domglue", $($arg)*);
	}};
}

/// Logs an error message
#[macro_export]
#[cfg(browser)]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::error_1(&format!($($arg)*).into());
	}};
}

/// Logs an error message
#[macro_export]
#[cfg(simulated)]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::error!(target: "domglue", $($arg)*);
	}};
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use crate::{debug_log, error_log, info_log, warn_log};

	#[rstest]
	fn test_logging_macros_accept_format_args() {
		debug_log!("callback {} released", "id_000001");
		info_log!("listeners: {}", 3);
		warn_log!("values: {:?}", vec![1, 2, 3]);
		error_log!("dispatch failed: {}", "boom");
	}

	#[rstest]
	fn test_logging_macros_plain_message() {
		debug_log!("debug");
		info_log!("info");
		warn_log!("warn");
		error_log!("error");
	}
}
