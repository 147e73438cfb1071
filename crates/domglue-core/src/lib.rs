//! domglue-core - dynamic values over a foreign JavaScript runtime
//!
//! Core of the domglue bridge: typed access to browser objects through a
//! single dynamic handle type, conversion of native data into foreign
//! objects, and native closures the foreign side can call.
//!
//! ## Architecture
//!
//! - [`value`]: [`DynamicValue`], the handle for any foreign value
//! - [`marshal`]: native-to-foreign conversion ([`Marshal`], [`Unmarshal`],
//!   serde bridge)
//! - [`callback`]: [`Callback`], native closures callable from the foreign
//!   side, with explicit release
//! - [`listener`] and [`target`]: event listener registration and the
//!   per-target listener registry
//! - [`event`]: typed view over foreign events
//! - [`runtime`]: the foreign runtime backend (`wasm-bindgen` in a browser,
//!   an in-process simulation everywhere else)
//! - [`spawn`]: hand-off of suspending work out of callbacks
//! - [`logging`]: `debug_log!` / `info_log!` / `warn_log!` / `error_log!`
//!
//! ## Example
//!
//! ```ignore
//! use domglue_core::{EventTarget, Marshal, Target, document};
//!
//! #[derive(Marshal)]
//! struct Config {
//!     name: String,
//!     values: Vec<i32>,
//! }
//!
//! let doc = document()?;
//! let button = Target::with_assigned_id(doc.call("createElement", ("button",))?)?;
//! button.value().set("config", Config { name: "x".into(), values: vec![1, 2] })?;
//!
//! let listener = button.add_event_listener("click", false, |event| {
//!     info_log!("clicked at {:?}", event.time_stamp());
//! })?;
//! // ...
//! button.remove_event_listener(&listener)?;
//! ```

// Lets `#[derive(Marshal)]` expand to `::domglue_core::...` inside this crate.
extern crate self as domglue_core;

pub mod callback;
pub mod error;
pub mod event;
pub mod id;
pub mod listener;
pub mod logging;
pub mod marshal;
pub mod node_list;
pub mod runtime;
pub mod spawn;
pub mod target;
pub mod types;
pub mod value;

pub use callback::{Callback, wrap};
pub use error::{BridgeError, Result};
pub use event::{Event, EventPhase};
pub use id::next_id;
pub use listener::{
	EventListener, ListenerId, ListenerRegistry, add_event_listener, remove_event_listener,
};
pub use marshal::{Marshal, Unmarshal, marshal};
#[cfg(feature = "serde")]
pub use marshal::to_dynamic;
pub use node_list::{array_to_values, node_list_to_values};
pub use spawn::spawn_local;
pub use target::{EventTarget, Target};
pub use types::Type;
pub use value::{DynamicValue, IntoArgs};

#[cfg(feature = "derive")]
pub use domglue_macros::Marshal;

/// The global object (`window` in a browser).
pub fn window() -> DynamicValue {
	DynamicValue::global()
}

/// `window.document`
pub fn document() -> Result<DynamicValue> {
	window().get("document")
}

#[doc(hidden)]
pub mod __private {
	pub use tracing;
	#[cfg(browser)]
	pub use web_sys;
}
