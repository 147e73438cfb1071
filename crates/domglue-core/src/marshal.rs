//! Native to foreign conversion
//!
//! [`Marshal`] turns a native value into a [`DynamicValue`], recursing
//! through the value's shape:
//!
//! | Native shape | Foreign value |
//! |--------------|---------------|
//! | `()`, `None` | `null` |
//! | `DynamicValue` | the same value (identity preserved) |
//! | `&T`, `Box<T>`, `Rc<T>`, `Arc<T>`, `Some(T)` | the pointee, marshalled |
//! | `Vec<T>`, `[T; N]`, `&[T]`, `VecDeque<T>` | a new array, elements in order |
//! | `HashMap<K, V>`, `BTreeMap<K, V>` with `K: AsRef<str>` | a new object, one property per key |
//! | `#[derive(Marshal)]` struct | a new object, fields in declaration order |
//! | numbers, `bool`, `char`, strings | the corresponding primitive |
//!
//! Map key order is whatever the map iterates in and must not be relied on.
//!
//! Composite values are built completely before they are returned, so a
//! failure part way through never leaves a half-populated object attached
//! to anything reachable.
//!
//! [`Unmarshal`] goes the other way for scalars, options, sequences and
//! string-keyed maps.

mod unmarshal;

#[cfg(feature = "serde")]
mod ser;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::Result;
use crate::runtime::{ActiveRuntime as Active, ForeignRuntime};
use crate::value::DynamicValue;

pub use unmarshal::Unmarshal;

#[cfg(feature = "serde")]
pub use ser::{Serializer, to_dynamic};

/// Conversion of a native value into a foreign one.
///
/// Object safe, so heterogeneous argument lists can be passed as
/// `&[&dyn Marshal]`. Structs get an implementation from
/// `#[derive(Marshal)]`:
///
/// ```ignore
/// use domglue_core::Marshal;
///
/// #[derive(Marshal)]
/// struct Record {
///     #[js(name = "name")]
///     label: String,
///     values: Vec<i32>,
///     #[js(skip)]
///     cache: Option<String>,
/// }
/// ```
pub trait Marshal {
	/// Produces the foreign representation of `self`.
	fn marshal(&self) -> Result<DynamicValue>;
}

/// Marshals any value; shorthand for `value.marshal()`.
pub fn marshal<T: Marshal + ?Sized>(value: &T) -> Result<DynamicValue> {
	value.marshal()
}

/// Creates an empty foreign object (`new Object()`).
pub fn new_object() -> Result<DynamicValue> {
	DynamicValue::global().get("Object")?.construct(())
}

/// Creates an empty foreign array (`new Array()`).
pub fn new_array() -> Result<DynamicValue> {
	DynamicValue::global().get("Array")?.construct(())
}

fn marshal_seq<'a, T, I>(items: I) -> Result<DynamicValue>
where
	T: Marshal + ?Sized + 'a,
	I: IntoIterator<Item = &'a T>,
{
	let array = new_array()?;
	for (index, item) in items.into_iter().enumerate() {
		array.set_index(index, item)?;
	}
	Ok(array)
}

fn marshal_entries<'a, K, V, I>(entries: I) -> Result<DynamicValue>
where
	K: AsRef<str> + 'a,
	V: Marshal + 'a,
	I: IntoIterator<Item = (&'a K, &'a V)>,
{
	let object = new_object()?;
	for (key, value) in entries {
		object.set(key.as_ref(), value)?;
	}
	Ok(object)
}

impl Marshal for DynamicValue {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(self.clone())
	}
}

impl Marshal for () {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(DynamicValue::null())
	}
}

impl Marshal for bool {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(DynamicValue::from_raw(Active::from_bool(*self)))
	}
}

macro_rules! impl_marshal_for_number {
	($($ty:ty),+) => {
		$(
			impl Marshal for $ty {
				fn marshal(&self) -> Result<DynamicValue> {
					Ok(DynamicValue::from_raw(Active::from_f64(*self as f64)))
				}
			}
		)+
	};
}

impl_marshal_for_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Marshal for char {
	fn marshal(&self) -> Result<DynamicValue> {
		let mut buf = [0; 4];
		Ok(DynamicValue::from_raw(Active::from_str(self.encode_utf8(&mut buf))))
	}
}

impl Marshal for str {
	fn marshal(&self) -> Result<DynamicValue> {
		Ok(DynamicValue::from_raw(Active::from_str(self)))
	}
}

impl Marshal for String {
	fn marshal(&self) -> Result<DynamicValue> {
		self.as_str().marshal()
	}
}

impl Marshal for Cow<'_, str> {
	fn marshal(&self) -> Result<DynamicValue> {
		self.as_ref().marshal()
	}
}

impl<T: Marshal> Marshal for Option<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		match self {
			Some(value) => value.marshal(),
			None => Ok(DynamicValue::null()),
		}
	}
}

impl<T: Marshal + ?Sized> Marshal for &T {
	fn marshal(&self) -> Result<DynamicValue> {
		(**self).marshal()
	}
}

impl<T: Marshal + ?Sized> Marshal for &mut T {
	fn marshal(&self) -> Result<DynamicValue> {
		(**self).marshal()
	}
}

impl<T: Marshal + ?Sized> Marshal for Box<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		(**self).marshal()
	}
}

impl<T: Marshal + ?Sized> Marshal for Rc<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		(**self).marshal()
	}
}

impl<T: Marshal + ?Sized> Marshal for Arc<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		(**self).marshal()
	}
}

impl<T: Marshal> Marshal for [T] {
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_seq(self)
	}
}

impl<T: Marshal, const N: usize> Marshal for [T; N] {
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_seq(self)
	}
}

impl<T: Marshal> Marshal for Vec<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_seq(self)
	}
}

impl<T: Marshal> Marshal for VecDeque<T> {
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_seq(self)
	}
}

impl<K, V, S> Marshal for HashMap<K, V, S>
where
	K: AsRef<str>,
	V: Marshal,
	S: BuildHasher,
{
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_entries(self)
	}
}

impl<K, V> Marshal for BTreeMap<K, V>
where
	K: AsRef<str>,
	V: Marshal,
{
	fn marshal(&self) -> Result<DynamicValue> {
		marshal_entries(self)
	}
}
