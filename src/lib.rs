//! # domglue
//!
//! Typed access to the browser object graph from Rust.
//!
//! domglue wraps every foreign value in a single handle type,
//! [`DynamicValue`], and layers three things on top of it:
//!
//! - **Marshalling**: native scalars, strings, sequences, maps and records
//!   (`#[derive(Marshal)]` or any `serde::Serialize` type) become foreign
//!   values in one call.
//! - **Callbacks**: native closures the foreign side can call, with
//!   explicit release.
//! - **Listeners**: event listeners that remember exactly how they were
//!   registered, so removal always matches, and a per-target registry.
//!
//! ## Feature Flags
//!
//! - `derive` (default): `#[derive(Marshal)]`
//! - `serde` (default): [`to_dynamic`] and `Marshal for serde_json::Value`
//! - `debug-hooks`: enables `debug_log!` in debug builds
//!
//! ## Backends
//!
//! On `wasm32-unknown-unknown` the bridge talks to the real JavaScript
//! runtime through `wasm-bindgen`. Every other target gets an in-process
//! simulation of the parts of the DOM the bridge relies on, so code built on
//! domglue can be unit tested natively.
//!
//! ## Example
//!
//! ```rust,ignore
//! use domglue::prelude::*;
//!
//! #[derive(Marshal)]
//! struct Options {
//!     name: String,
//!     values: Vec<i32>,
//! }
//!
//! let body = document()?.get("body")?;
//! let button = Target::with_assigned_id(document()?.call("createElement", ("button",))?)?;
//! body.call("appendChild", (button.value(),))?;
//!
//! button.value().set("options", Options { name: "x".into(), values: vec![1, 2] })?;
//! let listener = button.add_event_listener("click", false, |event| {
//!     let _ = event.prevent_default();
//! })?;
//! ```

pub use domglue_core::*;

/// Common imports for code built on domglue.
pub mod prelude {
	pub use domglue_core::{
		BridgeError, Callback, DynamicValue, Event, EventListener, EventTarget, Marshal, Result,
		Target, Unmarshal, document, window,
	};
	#[cfg(feature = "serde")]
	pub use domglue_core::to_dynamic;
}
