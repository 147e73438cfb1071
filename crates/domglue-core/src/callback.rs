//! Native closures callable from the foreign runtime.
//!
//! A [`Callback`] owns a foreign function value backed by a Rust closure.
//! The foreign side can hold and invoke the function value for as long as
//! the callback is alive and not released.
//!
//! ## Lifecycle
//!
//! - [`Callback::new`] (or [`wrap`]) creates the foreign function.
//! - [`Callback::release`] frees it. Later foreign invocations throw
//!   `call to released function`. Releasing twice is a no-op.
//! - Dropping the last handle without releasing leaves the foreign function
//!   callable for the rest of the program, since the foreign side may still
//!   hold it.
//!
//! ## Blocking
//!
//! The foreign runtime has a single execution context, and it waits for the
//! closure to return. Work that suspends must be handed to
//! [`spawn_local`](crate::spawn::spawn_local) instead of being awaited inline:
//!
//! ```ignore
//! use domglue_core::{Callback, spawn::spawn_local};
//!
//! let on_save = Callback::new(move |_this, _args| {
//!     spawn_local(async move {
//!         save_draft().await;
//!     });
//! })?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{BridgeError, Result};
use crate::marshal::Marshal;
use crate::runtime::{
	ActiveRuntime as Active, Exception, ForeignRuntime, NativeFn, RawFunction, RawValue,
};
use crate::value::DynamicValue;

/// A foreign-callable function backed by a Rust closure.
///
/// Cheap to clone; clones share the same foreign function and release state.
#[derive(Clone)]
pub struct Callback {
	inner: Rc<CallbackInner>,
}

struct CallbackInner {
	value: DynamicValue,
	// `None` once released.
	function: RefCell<Option<RawFunction>>,
}

impl Callback {
	/// Wraps `f` as a foreign function.
	///
	/// On each foreign invocation, `this` and the arguments are handed to `f`
	/// as [`DynamicValue`]s and the return value is marshalled back to the
	/// caller. A marshalling failure of the return value is thrown to the
	/// foreign caller.
	pub fn new<F, R>(f: F) -> Result<Self>
	where
		F: Fn(&DynamicValue, &[DynamicValue]) -> R + 'static,
		R: Marshal,
	{
		Self::try_new(move |this, args| Ok(f(this, args)))
	}

	/// Like [`new`](Self::new), for closures that can fail. An `Err` is
	/// thrown to the foreign caller as an `Error` carrying the message.
	pub fn try_new<F, R>(f: F) -> Result<Self>
	where
		F: Fn(&DynamicValue, &[DynamicValue]) -> Result<R> + 'static,
		R: Marshal,
	{
		let native: NativeFn<RawValue> = Rc::new(move |this: RawValue, args: Vec<RawValue>| {
			let this = DynamicValue::from_raw(this);
			let args: Vec<DynamicValue> = args.into_iter().map(DynamicValue::from_raw).collect();
			f(&this, &args)
				.and_then(|result| result.marshal())
				.map(DynamicValue::into_raw)
				.map_err(|e| Exception::new(e.to_string()))
		});
		let (value, function) = Active::new_function(native)
			.map_err(|e| BridgeError::invocation("create function", e.message()))?;
		Ok(Self {
			inner: Rc::new(CallbackInner {
				value: DynamicValue::from_raw(value),
				function: RefCell::new(Some(function)),
			}),
		})
	}

	/// The foreign function value. Pass it wherever the foreign side expects
	/// a function.
	pub fn value(&self) -> &DynamicValue {
		&self.inner.value
	}

	/// Releases the foreign function.
	///
	/// Safe to call while the callback is executing: the running invocation
	/// completes normally and only future invocations are refused. Calling
	/// it again has no effect.
	pub fn release(&self) {
		let function = self.inner.function.borrow_mut().take();
		if let Some(function) = function {
			Active::release_function(function);
			tracing::debug!(target: "domglue", "callback released");
		}
	}

	/// Returns true once [`release`](Self::release) has been called.
	pub fn is_released(&self) -> bool {
		self.inner.function.borrow().is_none()
	}
}

/// Wraps a native `(this, args) -> value` closure as a foreign function.
pub fn wrap<F, R>(f: F) -> Result<Callback>
where
	F: Fn(&DynamicValue, &[DynamicValue]) -> R + 'static,
	R: Marshal,
{
	Callback::new(f)
}

impl Drop for CallbackInner {
	fn drop(&mut self) {
		if let Some(function) = self.function.get_mut().take() {
			Active::forget_function(function);
		}
	}
}

impl Marshal for Callback {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(self.inner.value.clone())
	}
}

impl fmt::Debug for Callback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callback")
			.field("released", &self.is_released())
			.finish_non_exhaustive()
	}
}

#[cfg(all(test, simulated))]
mod tests {
	use super::*;
	use crate::runtime::sim;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_invocation_receives_this_and_args() {
		// Arrange
		sim::reset();
		let callback = wrap(|this, args| {
			let base = this.get("base").map(|v| v.as_f64().unwrap_or(0.0)).unwrap_or(0.0);
			base + args.iter().map(|a| a.as_f64().unwrap_or(0.0)).sum::<f64>()
		})
		.unwrap();
		let receiver = crate::marshal::new_object().unwrap();
		receiver.set("base", 10_i32).unwrap();
		receiver.set("sum", &callback).unwrap();

		// Act
		let result = receiver.call("sum", (1_i32, 2_i32)).unwrap();

		// Assert
		assert_eq!(result.as_f64().unwrap(), 13.0);
	}

	#[rstest]
	fn test_unit_result_is_null() {
		sim::reset();
		let callback = Callback::new(|_, _| ()).unwrap();
		assert!(callback.value().invoke(()).unwrap().is_null());
	}

	#[rstest]
	fn test_release_is_idempotent() {
		// Arrange
		sim::reset();
		let calls = Rc::new(Cell::new(0));
		let callback = Callback::new({
			let calls = Rc::clone(&calls);
			move |_, _| calls.set(calls.get() + 1)
		})
		.unwrap();
		callback.value().invoke(()).unwrap();

		// Act
		callback.release();
		callback.release();

		// Assert
		assert!(callback.is_released());
		assert_eq!(calls.get(), 1);
		let err = callback.value().invoke(()).unwrap_err();
		assert!(err.to_string().contains("call to released function"));
		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_release_during_invocation() {
		// Arrange
		sim::reset();
		let slot: Rc<RefCell<Option<Callback>>> = Rc::new(RefCell::new(None));
		let calls = Rc::new(Cell::new(0));
		let callback = Callback::new({
			let slot = Rc::clone(&slot);
			let calls = Rc::clone(&calls);
			move |_, _| {
				if let Some(me) = slot.borrow().as_ref() {
					me.release();
				}
				calls.set(calls.get() + 1);
				"finished"
			}
		})
		.unwrap();
		*slot.borrow_mut() = Some(callback.clone());

		// Act
		let first = callback.value().invoke(());
		let second = callback.value().invoke(());
		slot.borrow_mut().take();

		// Assert
		assert_eq!(first.unwrap().as_string(), "finished");
		assert!(second.is_err());
		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_try_new_error_is_thrown() {
		sim::reset();
		let callback = Callback::try_new(|_, _| -> Result<()> {
			Err(BridgeError::UnsupportedNativeShape("nope".to_string()))
		})
		.unwrap();
		let err = callback.value().invoke(()).unwrap_err();
		assert!(matches!(err, BridgeError::Invocation { ref message, .. } if message.contains("nope")));
	}
}
