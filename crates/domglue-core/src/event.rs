//! Typed view over a foreign event object.

use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::marshal::{Marshal, Unmarshal, new_object};
use crate::types::Type;
use crate::value::DynamicValue;

/// Dispatch phase reported by `Event.eventPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
	/// Not being dispatched.
	None,
	Capturing,
	AtTarget,
	Bubbling,
}

impl EventPhase {
	/// Maps the numeric DOM constant; unknown values map to `None`.
	pub fn from_code(code: u16) -> Self {
		match code {
			1 => EventPhase::Capturing,
			2 => EventPhase::AtTarget,
			3 => EventPhase::Bubbling,
			_ => EventPhase::None,
		}
	}
}

/// A foreign event, as received by listeners or created with [`Event::new`].
///
/// Every accessor reads the live foreign object, so values such as
/// `current_target` and `default_prevented` reflect the dispatch state at
/// the moment of the call.
#[derive(Debug, Clone)]
pub struct Event {
	value: DynamicValue,
}

impl Event {
	/// Constructs `new window.Event(type, { bubbles, cancelable })`.
	pub fn new(
		window: &DynamicValue,
		event_type: &str,
		bubbles: bool,
		cancelable: bool,
	) -> Result<Self> {
		let init = new_object()?;
		init.set("bubbles", bubbles)?;
		init.set("cancelable", cancelable)?;
		let value = window.get("Event")?.construct((event_type, init))?;
		Ok(Self { value })
	}

	/// Wraps a foreign event. `null` and `undefined` yield `None`.
	pub fn from_value(value: DynamicValue) -> Option<Self> {
		if value.is_null() || value.is_undefined() {
			None
		} else {
			Some(Self { value })
		}
	}

	/// Wraps whatever the foreign side passed as the event argument.
	pub(crate) fn decode(value: DynamicValue) -> Self {
		Self { value }
	}

	/// The wrapped foreign object.
	pub fn underlying(&self) -> &DynamicValue {
		&self.value
	}

	pub fn bubbles(&self) -> Result<bool> {
		self.value.get("bubbles")?.as_bool()
	}

	pub fn cancelable(&self) -> Result<bool> {
		self.value.get("cancelable")?.as_bool()
	}

	pub fn current_target(&self) -> Result<DynamicValue> {
		self.value.get("currentTarget")
	}

	pub fn target(&self) -> Result<DynamicValue> {
		self.value.get("target")
	}

	pub fn default_prevented(&self) -> Result<bool> {
		self.value.get("defaultPrevented")?.as_bool()
	}

	pub fn event_phase(&self) -> Result<EventPhase> {
		let code = self.value.get("eventPhase")?.unmarshal::<u16>()?;
		Ok(EventPhase::from_code(code))
	}

	/// Time the event was created, relative to the runtime's time origin.
	pub fn time_stamp(&self) -> Result<Duration> {
		let millis = self.value.get("timeStamp")?.as_f64()?;
		if millis.is_nan() || millis <= 0.0 {
			return Ok(Duration::ZERO);
		}
		Ok(Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX))
	}

	/// The event name, e.g. `"click"`.
	pub fn event_type(&self) -> Result<String> {
		self.value.get("type")?.unmarshal()
	}

	/// Whether propagation was stopped (`cancelBubble`).
	pub fn propagation_stopped(&self) -> Result<bool> {
		Ok(self.value.get("cancelBubble")?.truthy())
	}

	pub fn prevent_default(&self) -> Result<()> {
		self.value.call("preventDefault", ()).map(drop)
	}

	pub fn stop_propagation(&self) -> Result<()> {
		self.value.call("stopPropagation", ()).map(drop)
	}

	pub fn stop_immediate_propagation(&self) -> Result<()> {
		self.value.call("stopImmediatePropagation", ()).map(drop)
	}
}

impl Marshal for Event {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(self.value.clone())
	}
}

impl Unmarshal for Event {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		match value.type_of() {
			Type::Object => Ok(Self {
				value: value.clone(),
			}),
			found => Err(BridgeError::foreign_type("unmarshal Event", found)),
		}
	}
}
