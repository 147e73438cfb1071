//! Foreign runtime bindings
//!
//! A [`ForeignRuntime`] is the narrow set of primitives the bridge needs from
//! the host: primitive construction, type queries, property and index access,
//! calls, and native function creation. Everything else (marshalling,
//! callbacks, listeners) is written once against this trait.
//!
//! Two runtimes exist and exactly one is active per build:
//!
//! | cfg | Runtime | Host |
//! |-----|---------|------|
//! | `browser` | [`js::JsRuntime`] | the real JavaScript engine, through wasm-bindgen |
//! | `simulated` | [`sim::SimRuntime`] | an in-process object heap with JavaScript semantics |
//!
//! Both are single-threaded: values are only valid on the thread that
//! created them.

use std::fmt;
use std::rc::Rc;

use crate::types::Type;

#[cfg(browser)]
pub mod js;

#[cfg(simulated)]
pub mod sim;

/// The runtime selected for this build.
#[cfg(browser)]
pub type ActiveRuntime = js::JsRuntime;

/// The runtime selected for this build.
#[cfg(simulated)]
pub type ActiveRuntime = sim::SimRuntime;

pub(crate) type RawValue = <ActiveRuntime as ForeignRuntime>::Value;
pub(crate) type RawFunction = <ActiveRuntime as ForeignRuntime>::Function;

/// An exception thrown by foreign code, reduced to its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception(String);

impl Exception {
	/// Creates an exception with the given message.
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}

	/// Returns the exception message.
	pub fn message(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Exception {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A native function callable from the foreign side: `(this, args) -> result`.
pub type NativeFn<V> = Rc<dyn Fn(V, Vec<V>) -> Result<V, Exception>>;

/// Primitive operations of a foreign runtime.
///
/// Property and call operations assume the receiver has already been checked
/// by the caller ([`DynamicValue`](crate::DynamicValue) does this); they only
/// report exceptions thrown by the host itself.
pub trait ForeignRuntime {
	/// Handle to one foreign value.
	type Value: Clone + fmt::Debug;

	/// Owner of the native side of a function created by [`new_function`](Self::new_function).
	type Function;

	/// The `undefined` value.
	fn undefined() -> Self::Value;

	/// The `null` value.
	fn null() -> Self::Value;

	/// The global object (`globalThis` / `window`).
	fn global() -> Self::Value;

	/// Converts a boolean.
	fn from_bool(value: bool) -> Self::Value;

	/// Converts a number.
	fn from_f64(value: f64) -> Self::Value;

	/// Converts a string.
	fn from_str(value: &str) -> Self::Value;

	/// Classifies a value.
	fn type_of(value: &Self::Value) -> Type;

	/// Reports whether the value is `undefined`.
	fn is_undefined(value: &Self::Value) -> bool;

	/// Reports whether the value is `null`.
	fn is_null(value: &Self::Value) -> bool;

	/// Reports whether the value is the number `NaN`.
	fn is_nan(value: &Self::Value) -> bool;

	/// `a === b`
	fn strict_equals(a: &Self::Value, b: &Self::Value) -> bool;

	/// Boolean coercion.
	fn truthy(value: &Self::Value) -> bool;

	/// `value instanceof constructor`; `constructor` is a function.
	fn instance_of(value: &Self::Value, constructor: &Self::Value) -> Result<bool, Exception>;

	/// Reads a named property.
	fn get(target: &Self::Value, name: &str) -> Result<Self::Value, Exception>;

	/// Writes a named property.
	fn set(target: &Self::Value, name: &str, value: Self::Value) -> Result<(), Exception>;

	/// Deletes a named property.
	fn delete(target: &Self::Value, name: &str) -> Result<(), Exception>;

	/// Reads an indexed element.
	fn get_index(target: &Self::Value, index: u32) -> Result<Self::Value, Exception>;

	/// Writes an indexed element.
	fn set_index(target: &Self::Value, index: u32, value: Self::Value) -> Result<(), Exception>;

	/// Calls `function` with the given `this` and arguments.
	fn apply(
		function: &Self::Value,
		this: &Self::Value,
		args: &[Self::Value],
	) -> Result<Self::Value, Exception>;

	/// `new constructor(...args)`
	fn construct(constructor: &Self::Value, args: &[Self::Value]) -> Result<Self::Value, Exception>;

	/// Extracts a number.
	fn as_f64(value: &Self::Value) -> Option<f64>;

	/// Extracts a boolean.
	fn as_bool(value: &Self::Value) -> Option<bool>;

	/// Extracts a string primitive.
	fn as_string(value: &Self::Value) -> Option<String>;

	/// Creates a foreign function backed by `function`.
	fn new_function(
		function: NativeFn<Self::Value>,
	) -> Result<(Self::Value, Self::Function), Exception>;

	/// Frees the native side of a function. The foreign value throws if
	/// invoked afterwards.
	fn release_function(function: Self::Function);

	/// Gives up ownership of a function without releasing it; the foreign
	/// value stays callable for the rest of the program.
	fn forget_function(function: Self::Function);
}
