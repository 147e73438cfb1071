//! Process-wide identifier generation.
//!
//! Identifiers look like `id_000000`: a prefix, an underscore and a counter
//! zero-padded to six digits. Values past `999999` simply grow wider.

use parking_lot::{Mutex, const_mutex};

/// Prefix used by [`next_id`].
pub const ID_PREFIX: &str = "id";

/// A counter producing unique, strictly increasing identifiers.
///
/// Safe to share between threads; each call to [`next`](Self::next)
/// observes and increments the counter under a lock.
#[derive(Debug)]
pub struct IdGenerator {
	prefix: &'static str,
	counter: Mutex<u64>,
}

impl IdGenerator {
	/// Creates a generator whose first identifier is `{prefix}_000000`.
	pub const fn new(prefix: &'static str) -> Self {
		Self {
			prefix,
			counter: const_mutex(0),
		}
	}

	/// Returns the next identifier.
	pub fn next(&self) -> String {
		let mut counter = self.counter.lock();
		let id = format!("{}_{:06}", self.prefix, *counter);
		*counter += 1;
		id
	}

	/// Returns how many identifiers have been issued.
	pub fn issued(&self) -> u64 {
		*self.counter.lock()
	}
}

static IDS: IdGenerator = IdGenerator::new(ID_PREFIX);

/// Returns a fresh process-wide identifier (`id_000000`, `id_000001`, ...).
pub fn next_id() -> String {
	IDS.next()
}
