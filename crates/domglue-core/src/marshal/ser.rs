//! serde bridge
//!
//! Marshals any `Serialize` type with the same rules as [`Marshal`]:
//! `None` and unit become `null`, sequences and tuples become arrays, maps
//! and structs become objects. Enum variants are externally tagged: a unit
//! variant is its name, every other variant is `{ "Variant": payload }`.
//!
//! Map keys must serialize as strings (or unit variants, which serialize as
//! their name); anything else fails with
//! [`BridgeError::UnsupportedNativeShape`].

use std::fmt::Display;

use serde::Serialize;
use serde::ser::{self, Impossible};

use super::{Marshal, new_array, new_object};
use crate::error::{BridgeError, Result};
use crate::value::DynamicValue;

/// Marshals a `Serialize` value into a foreign value.
///
/// ```ignore
/// #[derive(serde::Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let point = domglue_core::marshal::to_dynamic(&Point { x: 1, y: 2 })?;
/// assert_eq!(point.get("x")?.as_i32()?, 1);
/// ```
pub fn to_dynamic<T: Serialize + ?Sized>(value: &T) -> Result<DynamicValue> {
	value.serialize(Serializer)
}

impl ser::Error for BridgeError {
	fn custom<T: Display>(msg: T) -> Self {
		BridgeError::UnsupportedNativeShape(msg.to_string())
	}
}

impl Marshal for serde_json::Value {
	fn marshal(&self) -> Result<DynamicValue> {
		to_dynamic(self)
	}
}

/// A serde `Serializer` producing [`DynamicValue`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer;

impl ser::Serializer for Serializer {
	type Ok = DynamicValue;
	type Error = BridgeError;

	type SerializeSeq = SerializeArray;
	type SerializeTuple = SerializeArray;
	type SerializeTupleStruct = SerializeArray;
	type SerializeTupleVariant = SerializeTupleVariant;
	type SerializeMap = SerializeObject;
	type SerializeStruct = SerializeObject;
	type SerializeStructVariant = SerializeStructVariant;

	fn serialize_bool(self, v: bool) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_i8(self, v: i8) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_i16(self, v: i16) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_i32(self, v: i32) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_i64(self, v: i64) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_u8(self, v: u8) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_u16(self, v: u16) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_u32(self, v: u32) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_u64(self, v: u64) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_f32(self, v: f32) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_f64(self, v: f64) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_char(self, v: char) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_str(self, v: &str) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_bytes(self, v: &[u8]) -> Result<DynamicValue> {
		v.marshal()
	}

	fn serialize_none(self) -> Result<DynamicValue> {
		Ok(DynamicValue::null())
	}

	fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<DynamicValue> {
		value.serialize(self)
	}

	fn serialize_unit(self) -> Result<DynamicValue> {
		Ok(DynamicValue::null())
	}

	fn serialize_unit_struct(self, _name: &'static str) -> Result<DynamicValue> {
		Ok(DynamicValue::null())
	}

	fn serialize_unit_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
	) -> Result<DynamicValue> {
		variant.marshal()
	}

	fn serialize_newtype_struct<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		value: &T,
	) -> Result<DynamicValue> {
		value.serialize(self)
	}

	fn serialize_newtype_variant<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		value: &T,
	) -> Result<DynamicValue> {
		let payload = value.serialize(self)?;
		let object = new_object()?;
		object.set(variant, payload)?;
		Ok(object)
	}

	fn serialize_seq(self, _len: Option<usize>) -> Result<SerializeArray> {
		SerializeArray::new()
	}

	fn serialize_tuple(self, _len: usize) -> Result<SerializeArray> {
		SerializeArray::new()
	}

	fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<SerializeArray> {
		SerializeArray::new()
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		_len: usize,
	) -> Result<SerializeTupleVariant> {
		Ok(SerializeTupleVariant {
			variant,
			array: SerializeArray::new()?,
		})
	}

	fn serialize_map(self, _len: Option<usize>) -> Result<SerializeObject> {
		SerializeObject::new()
	}

	fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeObject> {
		SerializeObject::new()
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		_len: usize,
	) -> Result<SerializeStructVariant> {
		Ok(SerializeStructVariant {
			variant,
			object: SerializeObject::new()?,
		})
	}
}

#[doc(hidden)]
pub struct SerializeArray {
	array: DynamicValue,
	len: usize,
}

impl SerializeArray {
	fn new() -> Result<Self> {
		Ok(Self {
			array: new_array()?,
			len: 0,
		})
	}

	fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		let value = value.serialize(Serializer)?;
		self.array.set_index(self.len, value)?;
		self.len += 1;
		Ok(())
	}
}

impl ser::SerializeSeq for SerializeArray {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		self.push(value)
	}

	fn end(self) -> Result<DynamicValue> {
		Ok(self.array)
	}
}

impl ser::SerializeTuple for SerializeArray {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		self.push(value)
	}

	fn end(self) -> Result<DynamicValue> {
		Ok(self.array)
	}
}

impl ser::SerializeTupleStruct for SerializeArray {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		self.push(value)
	}

	fn end(self) -> Result<DynamicValue> {
		Ok(self.array)
	}
}

#[doc(hidden)]
pub struct SerializeTupleVariant {
	variant: &'static str,
	array: SerializeArray,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		self.array.push(value)
	}

	fn end(self) -> Result<DynamicValue> {
		let object = new_object()?;
		object.set(self.variant, self.array.array)?;
		Ok(object)
	}
}

#[doc(hidden)]
pub struct SerializeObject {
	object: DynamicValue,
	pending_key: Option<String>,
}

impl SerializeObject {
	fn new() -> Result<Self> {
		Ok(Self {
			object: new_object()?,
			pending_key: None,
		})
	}
}

impl ser::SerializeMap for SerializeObject {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
		self.pending_key = Some(key.serialize(MapKeySerializer)?);
		Ok(())
	}

	fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
		let key = self.pending_key.take().ok_or_else(|| {
			BridgeError::UnsupportedNativeShape("map value without a key".to_string())
		})?;
		let value = value.serialize(Serializer)?;
		self.object.set(&key, value)
	}

	fn end(self) -> Result<DynamicValue> {
		Ok(self.object)
	}
}

impl ser::SerializeStruct for SerializeObject {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
		let value = value.serialize(Serializer)?;
		self.object.set(key, value)
	}

	fn end(self) -> Result<DynamicValue> {
		Ok(self.object)
	}
}

#[doc(hidden)]
pub struct SerializeStructVariant {
	variant: &'static str,
	object: SerializeObject,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
	type Ok = DynamicValue;
	type Error = BridgeError;

	fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
		ser::SerializeStruct::serialize_field(&mut self.object, key, value)
	}

	fn end(self) -> Result<DynamicValue> {
		let wrapper = new_object()?;
		wrapper.set(self.variant, self.object.object)?;
		Ok(wrapper)
	}
}

fn key_must_be_string(kind: &str) -> BridgeError {
	BridgeError::UnsupportedNativeShape(format!("map key must be a string, found {kind}"))
}

/// Accepts only keys that are strings on the foreign side.
struct MapKeySerializer;

impl ser::Serializer for MapKeySerializer {
	type Ok = String;
	type Error = BridgeError;

	type SerializeSeq = Impossible<String, BridgeError>;
	type SerializeTuple = Impossible<String, BridgeError>;
	type SerializeTupleStruct = Impossible<String, BridgeError>;
	type SerializeTupleVariant = Impossible<String, BridgeError>;
	type SerializeMap = Impossible<String, BridgeError>;
	type SerializeStruct = Impossible<String, BridgeError>;
	type SerializeStructVariant = Impossible<String, BridgeError>;

	fn serialize_str(self, v: &str) -> Result<String> {
		Ok(v.to_string())
	}

	fn serialize_char(self, v: char) -> Result<String> {
		Ok(v.to_string())
	}

	fn serialize_unit_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
	) -> Result<String> {
		Ok(variant.to_string())
	}

	fn serialize_newtype_struct<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		value: &T,
	) -> Result<String> {
		value.serialize(self)
	}

	fn serialize_bool(self, _v: bool) -> Result<String> {
		Err(key_must_be_string("bool"))
	}

	fn serialize_i8(self, _v: i8) -> Result<String> {
		Err(key_must_be_string("i8"))
	}

	fn serialize_i16(self, _v: i16) -> Result<String> {
		Err(key_must_be_string("i16"))
	}

	fn serialize_i32(self, _v: i32) -> Result<String> {
		Err(key_must_be_string("i32"))
	}

	fn serialize_i64(self, _v: i64) -> Result<String> {
		Err(key_must_be_string("i64"))
	}

	fn serialize_u8(self, _v: u8) -> Result<String> {
		Err(key_must_be_string("u8"))
	}

	fn serialize_u16(self, _v: u16) -> Result<String> {
		Err(key_must_be_string("u16"))
	}

	fn serialize_u32(self, _v: u32) -> Result<String> {
		Err(key_must_be_string("u32"))
	}

	fn serialize_u64(self, _v: u64) -> Result<String> {
		Err(key_must_be_string("u64"))
	}

	fn serialize_f32(self, _v: f32) -> Result<String> {
		Err(key_must_be_string("f32"))
	}

	fn serialize_f64(self, _v: f64) -> Result<String> {
		Err(key_must_be_string("f64"))
	}

	fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
		Err(key_must_be_string("bytes"))
	}

	fn serialize_none(self) -> Result<String> {
		Err(key_must_be_string("none"))
	}

	fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<String> {
		Err(key_must_be_string("option"))
	}

	fn serialize_unit(self) -> Result<String> {
		Err(key_must_be_string("unit"))
	}

	fn serialize_unit_struct(self, name: &'static str) -> Result<String> {
		Err(key_must_be_string(name))
	}

	fn serialize_newtype_variant<T: Serialize + ?Sized>(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		_value: &T,
	) -> Result<String> {
		Err(key_must_be_string(variant))
	}

	fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
		Err(key_must_be_string("sequence"))
	}

	fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
		Err(key_must_be_string("tuple"))
	}

	fn serialize_tuple_struct(
		self,
		name: &'static str,
		_len: usize,
	) -> Result<Self::SerializeTupleStruct> {
		Err(key_must_be_string(name))
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		_len: usize,
	) -> Result<Self::SerializeTupleVariant> {
		Err(key_must_be_string(variant))
	}

	fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
		Err(key_must_be_string("map"))
	}

	fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
		Err(key_must_be_string(name))
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
		_len: usize,
	) -> Result<Self::SerializeStructVariant> {
		Err(key_must_be_string(variant))
	}
}
