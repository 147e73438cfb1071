//! Foreign type tags.

use std::fmt;

/// The JavaScript type of a [`DynamicValue`](crate::DynamicValue).
///
/// Mirrors the `typeof` operator, except that `null` has its own tag
/// instead of reporting `object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
	/// `undefined`
	Undefined,
	/// `null`
	Null,
	/// `true` / `false`
	Boolean,
	/// Any IEEE 754 number, including `NaN`
	Number,
	/// A string primitive
	String,
	/// A symbol primitive
	Symbol,
	/// Any non-callable object, arrays included
	Object,
	/// A callable object
	Function,
}

impl Type {
	/// All tags, in declaration order.
	pub const ALL: [Type; 8] = [
		Type::Undefined,
		Type::Null,
		Type::Boolean,
		Type::Number,
		Type::String,
		Type::Symbol,
		Type::Object,
		Type::Function,
	];

	/// Returns the fixed name of this tag.
	pub const fn as_str(self) -> &'static str {
		match self {
			Type::Undefined => "undefined",
			Type::Null => "null",
			Type::Boolean => "boolean",
			Type::Number => "number",
			Type::String => "string",
			Type::Symbol => "symbol",
			Type::Object => "object",
			Type::Function => "function",
		}
	}

	/// Returns true for values that carry properties (objects and functions).
	pub const fn is_object(self) -> bool {
		matches!(self, Type::Object | Type::Function)
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Formats a number the way JavaScript's `String(n)` does.
///
/// Both use the shortest digits that round-trip. Magnitudes outside
/// `[1e-6, 1e21)` switch to exponent form with a signed exponent (`1e-7`,
/// `1.5e+21`).
pub(crate) fn number_to_string(n: f64) -> String {
	if n.is_nan() {
		return "NaN".to_string();
	}
	if n.is_infinite() {
		return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
	}
	if n == 0.0 {
		return "0".to_string();
	}
	let magnitude = n.abs();
	if (1e-6..1e21).contains(&magnitude) {
		return n.to_string();
	}
	let exponent_form = format!("{:e}", n);
	match exponent_form.split_once('e') {
		Some((mantissa, exponent)) if !exponent.starts_with('-') => {
			format!("{}e+{}", mantissa, exponent)
		}
		_ => exponent_form,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Type::Undefined, "undefined")]
	#[case(Type::Null, "null")]
	#[case(Type::Boolean, "boolean")]
	#[case(Type::Number, "number")]
	#[case(Type::String, "string")]
	#[case(Type::Symbol, "symbol")]
	#[case(Type::Object, "object")]
	#[case(Type::Function, "function")]
	fn test_type_display(#[case] tag: Type, #[case] expected: &str) {
		assert_eq!(tag.to_string(), expected);
	}

	#[rstest]
	fn test_type_rendering_never_empty() {
		for tag in Type::ALL {
			assert!(!tag.as_str().is_empty());
		}
	}

	#[rstest]
	fn test_type_order_is_declaration_order() {
		let mut sorted = Type::ALL;
		sorted.sort();
		assert_eq!(sorted, Type::ALL);
		assert!(Type::Undefined < Type::Function);
	}

	#[rstest]
	#[case(1.0, "1")]
	#[case(-0.0, "0")]
	#[case(1.5, "1.5")]
	#[case(f64::NAN, "NaN")]
	#[case(f64::INFINITY, "Infinity")]
	#[case(f64::NEG_INFINITY, "-Infinity")]
	#[case(123456789.0, "123456789")]
	#[case(0.000001, "0.000001")]
	#[case(1e-7, "1e-7")]
	#[case(-2.5e-9, "-2.5e-9")]
	#[case(1e20, "100000000000000000000")]
	#[case(1e21, "1e+21")]
	#[case(1.5e21, "1.5e+21")]
	#[case(f64::MAX, "1.7976931348623157e+308")]
	fn test_number_to_string(#[case] n: f64, #[case] expected: &str) {
		assert_eq!(number_to_string(n), expected);
	}
}
