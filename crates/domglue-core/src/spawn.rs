//! Hand-off of suspending work out of callbacks.
//!
//! A callback runs inside the foreign runtime's only execution context, so
//! it must return promptly. Anything that awaits is spawned here and runs
//! after the callback has returned.
//!
//! In a browser the future is queued on the JavaScript microtask queue. In
//! the simulated runtime it is queued on a per-thread executor which runs
//! when [`run_pending`] is called.

use std::future::Future;

/// Spawns a `!Send` future on the current thread.
#[cfg(browser)]
pub fn spawn_local<F>(future: F)
where
	F: Future<Output = ()> + 'static,
{
	wasm_bindgen_futures::spawn_local(future);
}

#[cfg(simulated)]
mod executor {
	use std::cell::RefCell;

	use futures::executor::{LocalPool, LocalSpawner};

	pub(super) struct Executor {
		pub(super) pool: RefCell<LocalPool>,
		pub(super) spawner: LocalSpawner,
	}

	impl Executor {
		fn new() -> Self {
			let pool = LocalPool::new();
			let spawner = pool.spawner();
			Self {
				pool: RefCell::new(pool),
				spawner,
			}
		}
	}

	thread_local! {
		pub(super) static EXECUTOR: Executor = Executor::new();
	}
}

/// Spawns a `!Send` future on the current thread.
///
/// The future does not start until [`run_pending`] drives the executor.
#[cfg(simulated)]
pub fn spawn_local<F>(future: F)
where
	F: Future<Output = ()> + 'static,
{
	use futures::task::LocalSpawnExt;

	executor::EXECUTOR.with(|executor| {
		if let Err(e) = executor.spawner.spawn_local(future) {
			crate::error_log!("failed to spawn local task: {}", e);
		}
	});
}

/// Runs every spawned task until none can make progress.
///
/// Must not be called from inside a spawned task.
#[cfg(simulated)]
pub fn run_pending() {
	executor::EXECUTOR.with(|executor| match executor.pool.try_borrow_mut() {
		Ok(mut pool) => pool.run_until_stalled(),
		Err(_) => crate::warn_log!("run_pending called re-entrantly; ignored"),
	});
}

#[cfg(all(test, simulated))]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;
	use std::rc::Rc;

	#[rstest]
	fn test_spawned_work_is_deferred() {
		// Arrange
		let done = Rc::new(Cell::new(false));

		// Act
		spawn_local({
			let done = Rc::clone(&done);
			async move { done.set(true) }
		});

		// Assert
		assert!(!done.get());
		run_pending();
		assert!(done.get());
	}

	#[rstest]
	fn test_tasks_can_spawn_tasks() {
		let count = Rc::new(Cell::new(0));
		let outer = Rc::clone(&count);
		spawn_local(async move {
			outer.set(outer.get() + 1);
			let inner = Rc::clone(&outer);
			spawn_local(async move { inner.set(inner.get() + 1) });
		});
		run_pending();
		assert_eq!(count.get(), 2);
	}
}
