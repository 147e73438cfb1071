//! Foreign to native extraction.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::{BridgeError, Result};
use crate::types::Type;
use crate::value::DynamicValue;

/// Extraction of a native value from a foreign one.
///
/// Scalars are strict about their tag: a string never unmarshals as a number
/// and vice versa. Use [`DynamicValue::truthy`] or [`DynamicValue::as_string`]
/// when coercion is wanted.
pub trait Unmarshal: Sized {
	/// Reads `value` as `Self`.
	fn unmarshal(value: &DynamicValue) -> Result<Self>;
}

impl Unmarshal for DynamicValue {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		Ok(value.clone())
	}
}

impl Unmarshal for bool {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		value.as_bool()
	}
}

impl Unmarshal for f64 {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		value.as_f64()
	}
}

impl Unmarshal for f32 {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		value.as_f64().map(|n| n as f32)
	}
}

macro_rules! impl_unmarshal_for_int {
	($($ty:ty),+) => {
		$(
			impl Unmarshal for $ty {
				/// Truncates toward zero, saturating at the bounds of the type.
				fn unmarshal(value: &DynamicValue) -> Result<Self> {
					value.as_f64().map(|n| n.trunc() as $ty)
				}
			}
		)+
	};
}

impl_unmarshal_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Unmarshal for String {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		match value.type_of() {
			Type::String => Ok(value.as_string()),
			found => Err(BridgeError::foreign_type("unmarshal String", found)),
		}
	}
}

impl<T: Unmarshal> Unmarshal for Option<T> {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		if value.is_null() || value.is_undefined() {
			Ok(None)
		} else {
			T::unmarshal(value).map(Some)
		}
	}
}

impl<T: Unmarshal> Unmarshal for Vec<T> {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		(0..value.length()?)
			.map(|i| value.index(i).and_then(|item| T::unmarshal(&item)))
			.collect()
	}
}

impl<V, S> Unmarshal for HashMap<String, V, S>
where
	V: Unmarshal,
	S: BuildHasher + Default,
{
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		unmarshal_entries(value)
	}
}

impl<V: Unmarshal> Unmarshal for BTreeMap<String, V> {
	fn unmarshal(value: &DynamicValue) -> Result<Self> {
		unmarshal_entries(value)
	}
}

fn unmarshal_entries<V, M>(value: &DynamicValue) -> Result<M>
where
	V: Unmarshal,
	M: FromIterator<(String, V)>,
{
	value
		.keys()?
		.into_iter()
		.map(|key| {
			let item = value.get(&key)?;
			V::unmarshal(&item).map(|v| (key, v))
		})
		.collect()
}
