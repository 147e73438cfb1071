//! Error types for domglue-core.

use thiserror::Error;

use crate::types::Type;

/// Errors raised while crossing the native/foreign boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
	/// The receiver's foreign type does not support the operation
	#[error("{operation} is not supported on a value of type {found}")]
	ForeignType {
		operation: &'static str,
		found: Type,
	},

	/// The named method is absent, or the property is not a function
	#[error("method {method:?} is not a function (got {found})")]
	NoSuchMethod { method: String, found: Type },

	/// The foreign call itself threw
	#[error("{target} threw: {message}")]
	Invocation { target: String, message: String },

	/// A native value has a shape the marshaller cannot traverse
	#[error("unsupported native shape: {0}")]
	UnsupportedNativeShape(String),
}

impl BridgeError {
	pub(crate) fn foreign_type(operation: &'static str, found: Type) -> Self {
		Self::ForeignType { operation, found }
	}

	pub(crate) fn invocation(target: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Invocation {
			target: target.into(),
			message: message.into(),
		}
	}
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_foreign_type_display() {
		// Arrange
		let err = BridgeError::foreign_type("get", Type::Number);

		// Act
		let message = err.to_string();

		// Assert
		assert_eq!(message, "get is not supported on a value of type number");
	}

	#[rstest]
	fn test_no_such_method_display() {
		let err = BridgeError::NoSuchMethod {
			method: "frobnicate".to_string(),
			found: Type::Undefined,
		};
		assert_eq!(
			err.to_string(),
			"method \"frobnicate\" is not a function (got undefined)"
		);
	}

	#[rstest]
	fn test_invocation_display() {
		let err = BridgeError::invocation("call focus", "TypeError: boom");
		assert!(err.to_string().contains("call focus"));
		assert!(err.to_string().contains("TypeError: boom"));
	}
}
