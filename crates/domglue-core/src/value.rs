//! Dynamic values
//!
//! [`DynamicValue`] is the one handle type for anything living in the
//! foreign runtime: objects, arrays, functions and primitives alike. Surface
//! types (documents, elements, canvases, ...) hold a `DynamicValue` and
//! implement their API as `get` / `set` / `call` sequences against it.
//!
//! ```ignore
//! use domglue_core::DynamicValue;
//!
//! let document = DynamicValue::global().get("document")?;
//! let div = document.call("createElement", ("div",))?;
//! div.set("id", "main")?;
//! assert_eq!(div.get("tagName")?.as_string(), "DIV");
//! ```

use std::fmt;

use crate::error::{BridgeError, Result};
use crate::marshal::{Marshal, Unmarshal};
use crate::runtime::{ActiveRuntime as Active, ForeignRuntime, RawValue};
use crate::types::{Type, number_to_string};

/// A handle to one value in the foreign runtime.
///
/// Cloning copies the handle, not the value: both clones refer to the same
/// foreign value. Equality is the foreign `===` through [`equals`](Self::equals);
/// there is no `PartialEq`.
#[derive(Clone)]
pub struct DynamicValue {
	raw: RawValue,
}

impl DynamicValue {
	/// The foreign `undefined`.
	pub fn undefined() -> Self {
		Self::from_raw(Active::undefined())
	}

	/// The foreign `null`.
	pub fn null() -> Self {
		Self::from_raw(Active::null())
	}

	/// The global object (`window` in a browser).
	pub fn global() -> Self {
		Self::from_raw(Active::global())
	}

	pub(crate) fn from_raw(raw: RawValue) -> Self {
		Self { raw }
	}

	pub(crate) fn raw(&self) -> &RawValue {
		&self.raw
	}

	pub(crate) fn into_raw(self) -> RawValue {
		self.raw
	}

	/// Classifies this value.
	pub fn type_of(&self) -> Type {
		Active::type_of(&self.raw)
	}

	fn require_object(&self, operation: &'static str) -> Result<()> {
		let found = self.type_of();
		if found.is_object() {
			Ok(())
		} else {
			Err(BridgeError::foreign_type(operation, found))
		}
	}

	/// Reads a property.
	///
	/// # Errors
	///
	/// [`BridgeError::ForeignType`] when the receiver is not an object or
	/// function. A getter that throws yields [`BridgeError::Invocation`].
	pub fn get(&self, name: &str) -> Result<DynamicValue> {
		self.require_object("get")?;
		Active::get(&self.raw, name)
			.map(Self::from_raw)
			.map_err(|e| BridgeError::invocation(format!("get {name}"), e.message()))
	}

	/// Marshals `value` and writes it to a property.
	///
	/// The value is fully marshalled before the receiver is touched, so a
	/// marshalling failure leaves the foreign object unchanged.
	pub fn set(&self, name: &str, value: impl Marshal) -> Result<()> {
		self.require_object("set")?;
		let value = value.marshal()?;
		Active::set(&self.raw, name, value.raw)
			.map_err(|e| BridgeError::invocation(format!("set {name}"), e.message()))
	}

	/// Deletes a property.
	pub fn delete(&self, name: &str) -> Result<()> {
		self.require_object("delete")?;
		Active::delete(&self.raw, name)
			.map_err(|e| BridgeError::invocation(format!("delete {name}"), e.message()))
	}

	/// Returns the names of the receiver's own enumerable properties
	/// (`Object.keys`).
	pub fn keys(&self) -> Result<Vec<String>> {
		self.require_object("keys")?;
		let object = Self::global().get("Object")?;
		let keys = object.call("keys", (self,))?;
		keys.unmarshal()
	}

	/// Reads an indexed element.
	pub fn index(&self, index: usize) -> Result<DynamicValue> {
		self.require_object("index")?;
		let result = match u32::try_from(index) {
			Ok(i) => Active::get_index(&self.raw, i),
			Err(_) => Active::get(&self.raw, &index.to_string()),
		};
		result
			.map(Self::from_raw)
			.map_err(|e| BridgeError::invocation(format!("index {index}"), e.message()))
	}

	/// Marshals `value` and writes it to an indexed element.
	pub fn set_index(&self, index: usize, value: impl Marshal) -> Result<()> {
		self.require_object("set_index")?;
		let value = value.marshal()?;
		let result = match u32::try_from(index) {
			Ok(i) => Active::set_index(&self.raw, i, value.raw),
			Err(_) => Active::set(&self.raw, &index.to_string(), value.raw),
		};
		result.map_err(|e| BridgeError::invocation(format!("set_index {index}"), e.message()))
	}

	/// Reads the `length` property of an array-like value.
	///
	/// # Errors
	///
	/// [`BridgeError::ForeignType`] when the receiver is not an object, or
	/// when its `length` is not a number.
	pub fn length(&self) -> Result<usize> {
		self.require_object("length")?;
		let length = self.get("length")?;
		let n = Active::as_f64(&length.raw)
			.ok_or_else(|| BridgeError::foreign_type("length", length.type_of()))?;
		Ok(if n.is_finite() && n > 0.0 { n as usize } else { 0 })
	}

	/// Calls the named method with the receiver as `this`.
	///
	/// # Errors
	///
	/// - [`BridgeError::ForeignType`] when the receiver is not an object
	/// - [`BridgeError::NoSuchMethod`] when the property is not a function
	/// - [`BridgeError::Invocation`] when the method throws
	/// - any marshalling error raised by `args`
	pub fn call(&self, method: &str, args: impl IntoArgs) -> Result<DynamicValue> {
		self.require_object("call")?;
		let function = self.get(method)?;
		let found = function.type_of();
		if found != Type::Function {
			return Err(BridgeError::NoSuchMethod {
				method: method.to_string(),
				found,
			});
		}
		let args = raw_args(args)?;
		Active::apply(&function.raw, &self.raw, &args)
			.map(Self::from_raw)
			.map_err(|e| BridgeError::invocation(format!("call {method}"), e.message()))
	}

	/// Calls the receiver itself, with `this` set to `undefined`.
	pub fn invoke(&self, args: impl IntoArgs) -> Result<DynamicValue> {
		let found = self.type_of();
		if found != Type::Function {
			return Err(BridgeError::foreign_type("invoke", found));
		}
		let args = raw_args(args)?;
		Active::apply(&self.raw, &Active::undefined(), &args)
			.map(Self::from_raw)
			.map_err(|e| BridgeError::invocation("invoke", e.message()))
	}

	/// `new receiver(...args)`
	pub fn construct(&self, args: impl IntoArgs) -> Result<DynamicValue> {
		let found = self.type_of();
		if found != Type::Function {
			return Err(BridgeError::foreign_type("construct", found));
		}
		let args = raw_args(args)?;
		Active::construct(&self.raw, &args)
			.map(Self::from_raw)
			.map_err(|e| BridgeError::invocation("construct", e.message()))
	}

	/// Extracts a number.
	pub fn as_f64(&self) -> Result<f64> {
		Active::as_f64(&self.raw).ok_or_else(|| BridgeError::foreign_type("as_f64", self.type_of()))
	}

	/// Extracts a number, truncated toward zero and saturated to `i64`.
	/// `NaN` becomes zero.
	pub fn as_i64(&self) -> Result<i64> {
		self.as_f64().map(|n| n.trunc() as i64)
	}

	/// Extracts a number, truncated toward zero and saturated to `i32`.
	pub fn as_i32(&self) -> Result<i32> {
		self.as_f64().map(|n| n.trunc() as i32)
	}

	/// Extracts a boolean. No truthiness coercion is applied; see [`truthy`](Self::truthy).
	pub fn as_bool(&self) -> Result<bool> {
		Active::as_bool(&self.raw).ok_or_else(|| BridgeError::foreign_type("as_bool", self.type_of()))
	}

	/// Returns the string content, or a placeholder naming the type.
	///
	/// Never fails: `<undefined>`, `<null>`, `<object>`, `<function>` and
	/// `<symbol>` for values without a natural rendering, `<boolean: true>`
	/// or `<number: 1.5>` for the other primitives.
	pub fn as_string(&self) -> String {
		match self.type_of() {
			Type::String => Active::as_string(&self.raw).unwrap_or_default(),
			Type::Boolean => match Active::as_bool(&self.raw) {
				Some(b) => format!("<boolean: {b}>"),
				None => "<boolean>".to_string(),
			},
			Type::Number => match Active::as_f64(&self.raw) {
				Some(n) => format!("<number: {}>", number_to_string(n)),
				None => "<number>".to_string(),
			},
			other => format!("<{other}>"),
		}
	}

	/// Foreign boolean coercion.
	pub fn truthy(&self) -> bool {
		Active::truthy(&self.raw)
	}

	/// Foreign strict equality (`===`).
	pub fn equals(&self, other: &DynamicValue) -> bool {
		Active::strict_equals(&self.raw, &other.raw)
	}

	/// `self instanceof constructor`
	pub fn instance_of(&self, constructor: &DynamicValue) -> Result<bool> {
		let found = constructor.type_of();
		if found != Type::Function {
			return Err(BridgeError::foreign_type("instance_of", found));
		}
		Active::instance_of(&self.raw, &constructor.raw)
			.map_err(|e| BridgeError::invocation("instanceof", e.message()))
	}

	pub fn is_undefined(&self) -> bool {
		Active::is_undefined(&self.raw)
	}

	pub fn is_null(&self) -> bool {
		Active::is_null(&self.raw)
	}

	pub fn is_nan(&self) -> bool {
		Active::is_nan(&self.raw)
	}

	/// Extracts a native value; see [`Unmarshal`].
	pub fn unmarshal<T: Unmarshal>(&self) -> Result<T> {
		T::unmarshal(self)
	}
}

#[cfg(browser)]
impl DynamicValue {
	/// Borrows the underlying `JsValue`.
	pub fn as_js(&self) -> &wasm_bindgen::JsValue {
		&self.raw
	}

	/// Unwraps into the underlying `JsValue`.
	pub fn into_js(self) -> wasm_bindgen::JsValue {
		self.raw
	}
}

#[cfg(browser)]
impl From<wasm_bindgen::JsValue> for DynamicValue {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		Self::from_raw(value)
	}
}

impl Default for DynamicValue {
	fn default() -> Self {
		Self::undefined()
	}
}

impl fmt::Debug for DynamicValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("DynamicValue").field(&self.raw).finish()
	}
}

fn raw_args(args: impl IntoArgs) -> Result<Vec<RawValue>> {
	Ok(args.into_args()?.into_iter().map(DynamicValue::into_raw).collect())
}

/// Argument lists for [`DynamicValue::call`], [`invoke`](DynamicValue::invoke)
/// and [`construct`](DynamicValue::construct).
///
/// Implemented for `()`, tuples of up to eight [`Marshal`] values, and
/// already-marshalled lists. A single sequence argument must be wrapped in
/// a one-element tuple, `(vec,)`, or it is spread into separate arguments.
pub trait IntoArgs {
	/// Marshals every argument, in order.
	fn into_args(self) -> Result<Vec<DynamicValue>>;
}

impl IntoArgs for () {
	fn into_args(self) -> Result<Vec<DynamicValue>> {
		Ok(Vec::new())
	}
}

impl IntoArgs for Vec<DynamicValue> {
	fn into_args(self) -> Result<Vec<DynamicValue>> {
		Ok(self)
	}
}

impl IntoArgs for &[DynamicValue] {
	fn into_args(self) -> Result<Vec<DynamicValue>> {
		Ok(self.to_vec())
	}
}

impl IntoArgs for &[&dyn Marshal] {
	fn into_args(self) -> Result<Vec<DynamicValue>> {
		self.iter().map(|arg| arg.marshal()).collect()
	}
}

macro_rules! impl_into_args_for_tuple {
	($($name:ident),+) => {
		impl<$($name: Marshal),+> IntoArgs for ($($name,)+) {
			#[allow(non_snake_case)]
			fn into_args(self) -> Result<Vec<DynamicValue>> {
				let ($($name,)+) = self;
				Ok(vec![$($name.marshal()?),+])
			}
		}
	};
}

impl_into_args_for_tuple!(A);
impl_into_args_for_tuple!(A, B);
impl_into_args_for_tuple!(A, B, C);
impl_into_args_for_tuple!(A, B, C, D);
impl_into_args_for_tuple!(A, B, C, D, E);
impl_into_args_for_tuple!(A, B, C, D, E, F);
impl_into_args_for_tuple!(A, B, C, D, E, F, G);
impl_into_args_for_tuple!(A, B, C, D, E, F, G, H);

#[cfg(all(test, simulated))]
mod tests {
	use super::*;
	use crate::runtime::sim;
	use rstest::{fixture, rstest};

	#[fixture]
	fn object() -> DynamicValue {
		sim::reset();
		DynamicValue::global()
			.get("Object")
			.and_then(|ctor| ctor.construct(()))
			.unwrap()
	}

	#[rstest]
	#[case(DynamicValue::undefined(), "<undefined>")]
	#[case(DynamicValue::null(), "<null>")]
	#[case(true.marshal().unwrap(), "<boolean: true>")]
	#[case(1.5_f64.marshal().unwrap(), "<number: 1.5>")]
	#[case(3_i32.marshal().unwrap(), "<number: 3>")]
	#[case("plain".marshal().unwrap(), "plain")]
	fn test_as_string_placeholders(#[case] value: DynamicValue, #[case] expected: &str) {
		assert_eq!(value.as_string(), expected);
	}

	#[rstest]
	fn test_as_string_object_and_function(object: DynamicValue) {
		assert_eq!(object.as_string(), "<object>");
		assert_eq!(DynamicValue::global().get("Object").unwrap().as_string(), "<function>");
	}

	#[rstest]
	fn test_get_on_primitive_is_foreign_type() {
		// Arrange
		let number = 42_i32.marshal().unwrap();

		// Act
		let err = number.get("x").unwrap_err();

		// Assert
		assert_eq!(
			err,
			BridgeError::ForeignType {
				operation: "get",
				found: Type::Number
			}
		);
	}

	#[rstest]
	fn test_set_then_get(object: DynamicValue) {
		object.set("answer", 42).unwrap();
		assert_eq!(object.get("answer").unwrap().as_i32().unwrap(), 42);
		assert!(object.get("missing").unwrap().is_undefined());
	}

	#[rstest]
	fn test_delete(object: DynamicValue) {
		object.set("gone", true).unwrap();
		object.delete("gone").unwrap();
		assert!(object.get("gone").unwrap().is_undefined());
		assert!(object.keys().unwrap().is_empty());
	}

	#[rstest]
	fn test_call_missing_method(object: DynamicValue) {
		let err = object.call("frobnicate", ()).unwrap_err();
		assert_eq!(
			err,
			BridgeError::NoSuchMethod {
				method: "frobnicate".to_string(),
				found: Type::Undefined
			}
		);
	}

	#[rstest]
	fn test_call_non_function_property(object: DynamicValue) {
		object.set("count", 1).unwrap();
		let err = object.call("count", ()).unwrap_err();
		assert!(matches!(err, BridgeError::NoSuchMethod { found: Type::Number, .. }));
	}

	#[rstest]
	fn test_invoke_non_function(object: DynamicValue) {
		let err = object.invoke(()).unwrap_err();
		assert!(matches!(err, BridgeError::ForeignType { operation: "invoke", .. }));
	}

	#[rstest]
	#[case(-2.7, -2)]
	#[case(2.7, 2)]
	#[case(f64::NAN, 0)]
	fn test_as_i64_truncates(#[case] input: f64, #[case] expected: i64) {
		sim::reset();
		assert_eq!(input.marshal().unwrap().as_i64().unwrap(), expected);
	}

	#[rstest]
	fn test_as_bool_is_strict() {
		let err = 1_i32.marshal().unwrap().as_bool().unwrap_err();
		assert!(matches!(err, BridgeError::ForeignType { found: Type::Number, .. }));
	}

	#[rstest]
	#[case(DynamicValue::undefined(), false)]
	#[case(DynamicValue::null(), false)]
	#[case(false.marshal().unwrap(), false)]
	#[case(0_i32.marshal().unwrap(), false)]
	#[case((-0.0_f64).marshal().unwrap(), false)]
	#[case(f64::NAN.marshal().unwrap(), false)]
	#[case("".marshal().unwrap(), false)]
	#[case("0".marshal().unwrap(), true)]
	#[case(1_i32.marshal().unwrap(), true)]
	fn test_truthy(#[case] value: DynamicValue, #[case] expected: bool) {
		assert_eq!(value.truthy(), expected);
	}

	#[rstest]
	fn test_predicates_are_independent() {
		let nan = f64::NAN.marshal().unwrap();
		assert_eq!(nan.type_of(), Type::Number);
		assert!(nan.is_nan());
		assert!(!nan.equals(&nan));
		assert!(!DynamicValue::null().is_undefined());
		assert!(!DynamicValue::undefined().is_null());
	}

	#[rstest]
	fn test_equals_is_identity_for_objects(object: DynamicValue) {
		let same = object.clone();
		let other = DynamicValue::global().get("Object").unwrap().construct(()).unwrap();
		assert!(object.equals(&same));
		assert!(!object.equals(&other));
	}

	#[rstest]
	fn test_instance_of(object: DynamicValue) {
		let object_ctor = DynamicValue::global().get("Object").unwrap();
		let array_ctor = DynamicValue::global().get("Array").unwrap();
		assert!(object.instance_of(&object_ctor).unwrap());
		assert!(!object.instance_of(&array_ctor).unwrap());
		assert!(object.instance_of(&object).is_err());
	}

	#[rstest]
	fn test_length_and_index() {
		sim::reset();
		let array = vec![10_i32, 20, 30].marshal().unwrap();
		assert_eq!(array.length().unwrap(), 3);
		assert_eq!(array.index(1).unwrap().as_i32().unwrap(), 20);
		array.set_index(3, 40).unwrap();
		assert_eq!(array.length().unwrap(), 4);
	}

	#[rstest]
	fn test_length_requires_numeric_length(object: DynamicValue) {
		let err = object.length().unwrap_err();
		assert!(matches!(err, BridgeError::ForeignType { found: Type::Undefined, .. }));
	}

	#[rstest]
	fn test_construct_throw_is_invocation() {
		sim::reset();
		let event = DynamicValue::global().get("Event").unwrap();
		let err = event.construct(()).unwrap_err();
		assert!(matches!(err, BridgeError::Invocation { .. }));
	}
}
