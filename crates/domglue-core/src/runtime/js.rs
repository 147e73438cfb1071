//! Browser runtime backed by wasm-bindgen.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{Exception, ForeignRuntime, NativeFn};
use crate::types::Type;

type Trampolined = dyn Fn(JsValue, Array) -> Result<JsValue, JsValue>;

/// The real JavaScript host.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsRuntime;

/// Owns the Rust closure behind a function created by [`JsRuntime::new_function`].
pub struct JsFunction {
	closure: Closure<Trampolined>,
}

impl std::fmt::Debug for JsFunction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JsFunction").finish_non_exhaustive()
	}
}

thread_local! {
	// Closures only see their arguments; this adapter forwards `this` as well.
	static TRAMPOLINE: Function = Function::new_with_args(
		"f",
		"return function() { return f(this, Array.prototype.slice.call(arguments)); };",
	);

	static INSTANCE_OF: Function = Function::new_with_args("v, c", "return v instanceof c;");
}

fn exception(error: JsValue) -> Exception {
	if let Some(error) = error.dyn_ref::<js_sys::Error>() {
		return Exception::new(String::from(error.to_string()));
	}
	match error.as_string() {
		Some(message) => Exception::new(message),
		None => Exception::new(format!("{:?}", error)),
	}
}

fn to_array(args: &[JsValue]) -> Array {
	args.iter().collect()
}

impl ForeignRuntime for JsRuntime {
	type Value = JsValue;
	type Function = JsFunction;

	fn undefined() -> JsValue {
		JsValue::UNDEFINED
	}

	fn null() -> JsValue {
		JsValue::NULL
	}

	fn global() -> JsValue {
		js_sys::global().into()
	}

	fn from_bool(value: bool) -> JsValue {
		JsValue::from_bool(value)
	}

	fn from_f64(value: f64) -> JsValue {
		JsValue::from_f64(value)
	}

	fn from_str(value: &str) -> JsValue {
		JsValue::from_str(value)
	}

	fn type_of(value: &JsValue) -> Type {
		if value.is_undefined() {
			Type::Undefined
		} else if value.is_null() {
			Type::Null
		} else if value.as_bool().is_some() {
			Type::Boolean
		} else if value.as_f64().is_some() || value.is_bigint() {
			Type::Number
		} else if value.is_string() {
			Type::String
		} else if value.is_symbol() {
			Type::Symbol
		} else if value.is_function() {
			Type::Function
		} else {
			Type::Object
		}
	}

	fn is_undefined(value: &JsValue) -> bool {
		value.is_undefined()
	}

	fn is_null(value: &JsValue) -> bool {
		value.is_null()
	}

	fn is_nan(value: &JsValue) -> bool {
		value.as_f64().is_some_and(f64::is_nan)
	}

	fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
		a == b
	}

	fn truthy(value: &JsValue) -> bool {
		value.is_truthy()
	}

	fn instance_of(value: &JsValue, constructor: &JsValue) -> Result<bool, Exception> {
		INSTANCE_OF
			.with(|f| f.call2(&JsValue::NULL, value, constructor))
			.map(|result| result.is_truthy())
			.map_err(exception)
	}

	fn get(target: &JsValue, name: &str) -> Result<JsValue, Exception> {
		Reflect::get(target, &JsValue::from_str(name)).map_err(exception)
	}

	fn set(target: &JsValue, name: &str, value: JsValue) -> Result<(), Exception> {
		Reflect::set(target, &JsValue::from_str(name), &value)
			.map(drop)
			.map_err(exception)
	}

	fn delete(target: &JsValue, name: &str) -> Result<(), Exception> {
		Reflect::delete_property(target.unchecked_ref::<Object>(), &JsValue::from_str(name))
			.map(drop)
			.map_err(exception)
	}

	fn get_index(target: &JsValue, index: u32) -> Result<JsValue, Exception> {
		Reflect::get_u32(target, index).map_err(exception)
	}

	fn set_index(target: &JsValue, index: u32, value: JsValue) -> Result<(), Exception> {
		Reflect::set_u32(target, index, &value)
			.map(drop)
			.map_err(exception)
	}

	fn apply(function: &JsValue, this: &JsValue, args: &[JsValue]) -> Result<JsValue, Exception> {
		function
			.unchecked_ref::<Function>()
			.apply(this, &to_array(args))
			.map_err(exception)
	}

	fn construct(constructor: &JsValue, args: &[JsValue]) -> Result<JsValue, Exception> {
		Reflect::construct(constructor.unchecked_ref::<Function>(), &to_array(args))
			.map_err(exception)
	}

	fn as_f64(value: &JsValue) -> Option<f64> {
		value.as_f64()
	}

	fn as_bool(value: &JsValue) -> Option<bool> {
		value.as_bool()
	}

	fn as_string(value: &JsValue) -> Option<String> {
		value.as_string()
	}

	fn new_function(function: NativeFn<JsValue>) -> Result<(JsValue, JsFunction), Exception> {
		let closure = Closure::wrap(Box::new(move |this: JsValue, args: Array| {
			function(this, args.iter().collect())
				.map_err(|e| JsValue::from(js_sys::Error::new(e.message())))
		}) as Box<Trampolined>);
		let value = TRAMPOLINE
			.with(|trampoline| trampoline.call1(&JsValue::NULL, closure.as_ref()))
			.map_err(exception)?;
		Ok((value, JsFunction { closure }))
	}

	fn release_function(function: JsFunction) {
		drop(function.closure);
	}

	fn forget_function(function: JsFunction) {
		function.closure.forget();
	}
}
