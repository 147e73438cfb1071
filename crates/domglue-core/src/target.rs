//! Event-bearing targets.
//!
//! [`EventTarget`] is the capability every event-bearing surface type
//! (window, document, element) exposes. [`Target`] is the standard
//! implementation: a foreign value plus the registry of listeners added
//! through it.
//!
//! ```ignore
//! use domglue_core::{EventTarget, Target};
//!
//! let button = Target::with_assigned_id(document.call("createElement", ("button",))?)?;
//! let listener = button.add_event_listener("click", false, |event| {
//!     info_log!("clicked: {:?}", event.event_type());
//! })?;
//! button.remove_event_listener(&listener)?;
//! ```

use std::cell::RefCell;

use crate::error::Result;
use crate::event::Event;
use crate::id::next_id;
use crate::listener::{self, EventListener, ListenerRegistry};
use crate::value::DynamicValue;

/// Listener management on a foreign event target.
pub trait EventTarget {
	/// Registers `handler` for `event_type` and returns the listener handle.
	fn add_event_listener<F>(&self, event_type: &str, capture: bool, handler: F) -> Result<EventListener>
	where
		F: Fn(&Event) + 'static;

	/// Unregisters `listener` and releases its callback. Unknown listeners
	/// are not an error.
	fn remove_event_listener(&self, listener: &EventListener) -> Result<()>;

	/// Dispatches `event` synchronously. Returns `false` when a cancelable
	/// event had its default prevented.
	fn dispatch_event(&self, event: &Event) -> Result<bool>;
}

/// A foreign event target that tracks the listeners added through it.
#[derive(Debug)]
pub struct Target {
	value: DynamicValue,
	assigned_id: Option<String>,
	listeners: RefCell<ListenerRegistry>,
}

impl Target {
	pub fn new(value: DynamicValue) -> Self {
		Self {
			value,
			assigned_id: None,
			listeners: RefCell::new(ListenerRegistry::new()),
		}
	}

	/// Wraps `value` and sets its foreign `id` property to a fresh
	/// [`next_id`].
	pub fn with_assigned_id(value: DynamicValue) -> Result<Self> {
		let id = next_id();
		value.set("id", id.as_str())?;
		Ok(Self {
			assigned_id: Some(id),
			..Self::new(value)
		})
	}

	pub fn value(&self) -> &DynamicValue {
		&self.value
	}

	/// The id assigned by [`with_assigned_id`](Self::with_assigned_id).
	pub fn assigned_id(&self) -> Option<&str> {
		self.assigned_id.as_deref()
	}

	/// Number of listeners currently registered through this target.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Removes and releases every listener registered through this target.
	///
	/// All listeners are removed and released even if some foreign
	/// unregistrations fail; the first failure is returned.
	pub fn remove_all_event_listeners(&self) -> Result<()> {
		let drained = self.listeners.borrow_mut().drain();
		let count = drained.len();
		let mut first_error = None;
		for listener in drained {
			if let Err(e) = listener::remove_event_listener(&self.value, &listener) {
				first_error.get_or_insert(e);
			}
		}
		tracing::debug!(target: "domglue", count, "removed all event listeners");
		first_error.map_or(Ok(()), Err)
	}
}

impl EventTarget for Target {
	fn add_event_listener<F>(&self, event_type: &str, capture: bool, handler: F) -> Result<EventListener>
	where
		F: Fn(&Event) + 'static,
	{
		let listener = listener::add_event_listener(&self.value, event_type, capture, handler)?;
		self.listeners.borrow_mut().register(listener.clone());
		Ok(listener)
	}

	fn remove_event_listener(&self, listener: &EventListener) -> Result<()> {
		self.listeners.borrow_mut().unregister(listener.id());
		listener::remove_event_listener(&self.value, listener)
	}

	fn dispatch_event(&self, event: &Event) -> Result<bool> {
		self.value.call("dispatchEvent", (event,))?.as_bool()
	}
}

impl From<DynamicValue> for Target {
	fn from(value: DynamicValue) -> Self {
		Self::new(value)
	}
}
