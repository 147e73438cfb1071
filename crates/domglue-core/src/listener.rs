//! Event listener registration
//!
//! [`add_event_listener`] wraps a native handler in a [`Callback`] that
//! decodes the foreign event argument into an [`Event`], registers it on the
//! foreign target, and returns the [`EventListener`] needed to undo the
//! registration.
//!
//! Foreign targets only remove a listener when the exact
//! `(type, function, capture)` triple used at registration is passed back,
//! so the listener keeps all three. [`remove_event_listener`] passes them
//! back and then releases the callback; release happens even when the
//! foreign call fails.
//!
//! [`ListenerRegistry`] is the per-target bookkeeping used by
//! [`Target`](crate::Target) to find and bulk-remove listeners by id.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::callback::Callback;
use crate::error::Result;
use crate::event::Event;
use crate::id::next_id;
use crate::value::DynamicValue;

/// Generated identity of a listener (`id_000042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(String);

impl ListenerId {
	fn generate() -> Self {
		Self(next_id())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ListenerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A registered listener.
///
/// Holds the callback together with the event type and capture flag it was
/// registered with. Clones refer to the same registration.
#[derive(Clone)]
pub struct EventListener {
	inner: Rc<ListenerInner>,
}

struct ListenerInner {
	id: ListenerId,
	event_type: String,
	capture: bool,
	callback: Callback,
}

impl EventListener {
	pub fn id(&self) -> &ListenerId {
		&self.inner.id
	}

	pub fn event_type(&self) -> &str {
		&self.inner.event_type
	}

	pub fn capture(&self) -> bool {
		self.inner.capture
	}

	/// The callback registered with the foreign target.
	pub fn callback(&self) -> &Callback {
		&self.inner.callback
	}

	pub fn is_released(&self) -> bool {
		self.inner.callback.is_released()
	}
}

impl fmt::Debug for EventListener {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventListener")
			.field("id", &self.inner.id)
			.field("event_type", &self.inner.event_type)
			.field("capture", &self.inner.capture)
			.field("released", &self.is_released())
			.finish()
	}
}

/// Registers `handler` for `event_type` on a foreign event target.
///
/// The handler receives the decoded event. When the foreign side invokes
/// the listener without an event, the handler sees a view over `undefined`
/// whose accessors fail with [`ForeignType`](crate::BridgeError::ForeignType).
///
/// If the foreign registration fails, the callback is released before the
/// error is returned.
pub fn add_event_listener<F>(
	target: &DynamicValue,
	event_type: &str,
	capture: bool,
	handler: F,
) -> Result<EventListener>
where
	F: Fn(&Event) + 'static,
{
	let callback = Callback::new(move |_this, args| {
		let event = Event::decode(args.first().cloned().unwrap_or_default());
		handler(&event);
	})?;

	if let Err(e) = target.call("addEventListener", (event_type, &callback, capture)) {
		callback.release();
		return Err(e);
	}

	let id = ListenerId::generate();
	tracing::debug!(target: "domglue", listener = %id, event_type, capture, "event listener added");
	Ok(EventListener {
		inner: Rc::new(ListenerInner {
			id,
			event_type: event_type.to_string(),
			capture,
			callback,
		}),
	})
}

/// Unregisters `listener` from a foreign event target and releases its
/// callback.
///
/// Removing a listener that is no longer registered is not an error.
pub fn remove_event_listener(target: &DynamicValue, listener: &EventListener) -> Result<()> {
	let _release = scopeguard::guard(listener.callback().clone(), |callback| callback.release());
	target.call(
		"removeEventListener",
		(listener.event_type(), listener.callback(), listener.capture()),
	)?;
	tracing::debug!(target: "domglue", listener = %listener.id(), "event listener removed");
	Ok(())
}

/// Listeners of one target, keyed by id.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
	listeners: HashMap<ListenerId, EventListener>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `listener` under its own id.
	pub fn register(&mut self, listener: EventListener) {
		self.listeners.insert(listener.id().clone(), listener);
	}

	/// Removes and returns the listener with `id`, if present.
	pub fn unregister(&mut self, id: &ListenerId) -> Option<EventListener> {
		self.listeners.remove(id)
	}

	pub fn get(&self, id: &ListenerId) -> Option<&EventListener> {
		self.listeners.get(id)
	}

	pub fn contains(&self, id: &ListenerId) -> bool {
		self.listeners.contains_key(id)
	}

	/// Ids of all registered listeners, in no particular order.
	pub fn ids(&self) -> impl Iterator<Item = &ListenerId> {
		self.listeners.keys()
	}

	/// Removes and returns every listener, in no particular order.
	pub fn drain(&mut self) -> Vec<EventListener> {
		self.listeners.drain().map(|(_, listener)| listener).collect()
	}

	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}
}
