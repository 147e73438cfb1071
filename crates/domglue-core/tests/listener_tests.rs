//! Event listener integration tests
//!
//! Success Criteria:
//! 1. A registered handler sees each dispatched event exactly once
//! 2. Removing one handler leaves the others receiving
//! 3. Bulk removal empties the registry and releases every callback
//! 4. Generated ids stay unique under contention
//!
//! Test Categories:
//! - Use Cases: 3 tests
//! - State Transitions: 2 tests
//! - Concurrency: 1 test

#![cfg(not(target_arch = "wasm32"))]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, Barrier};
use std::thread;

use domglue_core::runtime::sim;
use domglue_core::{Event, EventListener, EventPhase, EventTarget, Target, document, next_id, window};
use rstest::*;

// ============================================================================
// Fixtures
// ============================================================================

#[fixture]
fn button() -> Target {
	sim::reset();
	let document = document().unwrap();
	let element = document.call("createElement", ("button",)).unwrap();
	document
		.get("body")
		.unwrap()
		.call("appendChild", (&element,))
		.unwrap();
	Target::with_assigned_id(element).unwrap()
}

fn click() -> Event {
	Event::new(&window(), "click", true, true).unwrap()
}

fn counting_listener(target: &Target, event_type: &str, counter: &Rc<Cell<u32>>) -> EventListener {
	let counter = Rc::clone(counter);
	target
		.add_event_listener(event_type, false, move |_| counter.set(counter.get() + 1))
		.unwrap()
}

// ============================================================================
// Use Case Tests
// ============================================================================

/// Tests registering, dispatching and removing a click handler
#[rstest]
fn test_click_scenario(button: Target) {
	// Arrange
	let seen = Rc::new(RefCell::new(Vec::new()));
	let listener = button
		.add_event_listener("click", false, {
			let seen = Rc::clone(&seen);
			move |event| seen.borrow_mut().push(event.event_type().unwrap())
		})
		.unwrap();

	// Act
	button.dispatch_event(&click()).unwrap();

	// Assert
	assert_eq!(*seen.borrow(), ["click"]);

	// Act
	button.remove_event_listener(&listener).unwrap();
	button.dispatch_event(&click()).unwrap();

	// Assert
	assert_eq!(seen.borrow().len(), 1);
	assert!(listener.is_released());
}

/// Tests what a handler observes during dispatch
#[rstest]
fn test_handler_observes_dispatch_state(button: Target) {
	// Arrange
	let observed = Rc::new(RefCell::new(None));
	let _listener = button
		.add_event_listener("click", false, {
			let observed = Rc::clone(&observed);
			move |event| {
				*observed.borrow_mut() = Some((
					event.target().unwrap(),
					event.current_target().unwrap(),
					event.event_phase().unwrap(),
				));
			}
		})
		.unwrap();
	let event = click();

	// Act
	button.dispatch_event(&event).unwrap();

	// Assert
	let (target, current, phase) = observed.borrow_mut().take().unwrap();
	assert!(target.equals(button.value()));
	assert!(current.equals(button.value()));
	assert_eq!(phase, EventPhase::AtTarget);
	assert_eq!(event.event_phase().unwrap(), EventPhase::None);
	assert!(event.current_target().unwrap().is_null());
	assert!(event.target().unwrap().equals(button.value()));
}

/// Tests that the assigned id finds the element again
#[rstest]
fn test_assigned_id_lookup(button: Target) {
	let id = button.assigned_id().unwrap();
	let found = document().unwrap().call("getElementById", (id,)).unwrap();
	assert!(found.equals(button.value()));
}

// ============================================================================
// State Transition Tests
// ============================================================================

/// Tests that removal stops delivery to one handler only
#[rstest]
fn test_removal_keeps_other_handlers(button: Target) {
	// Arrange
	let removed_count = Rc::new(Cell::new(0));
	let kept_count = Rc::new(Cell::new(0));
	let removed = counting_listener(&button, "click", &removed_count);
	let _kept = counting_listener(&button, "click", &kept_count);
	button.dispatch_event(&click()).unwrap();

	// Act
	button.remove_event_listener(&removed).unwrap();
	button.dispatch_event(&click()).unwrap();
	button.remove_event_listener(&removed).unwrap();

	// Assert
	assert_eq!(removed_count.get(), 1);
	assert_eq!(kept_count.get(), 2);
	assert_eq!(button.listener_count(), 1);
	assert_eq!(sim::listener_count(button.value()), 1);
}

/// Tests that bulk removal empties the registry and releases everything
#[rstest]
fn test_remove_all(button: Target) {
	// Arrange
	let count = Rc::new(Cell::new(0));
	let listeners: Vec<_> = ["click", "click", "focus", "keydown"]
		.iter()
		.map(|t| counting_listener(&button, t, &count))
		.collect();

	// Act
	button.remove_all_event_listeners().unwrap();
	button.dispatch_event(&click()).unwrap();

	// Assert
	assert_eq!(count.get(), 0);
	assert_eq!(button.listener_count(), 0);
	assert_eq!(sim::listener_count(button.value()), 0);
	assert!(listeners.iter().all(EventListener::is_released));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

/// Tests id uniqueness across threads started together
#[rstest]
fn test_ids_unique_under_contention() {
	// Arrange
	let threads = 8;
	let per_thread = 500;
	let barrier = Arc::new(Barrier::new(threads));

	// Act
	let handles: Vec<_> = (0..threads)
		.map(|_| {
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				(0..per_thread).map(|_| next_id()).collect::<Vec<_>>()
			})
		})
		.collect();
	let ids: Vec<String> = handles
		.into_iter()
		.flat_map(|h| h.join().unwrap())
		.collect();

	// Assert
	let unique: HashSet<&String> = ids.iter().collect();
	assert_eq!(unique.len(), threads * per_thread);
	assert!(ids.iter().all(|id| id.starts_with("id_") && id.len() >= 9));
}
