//! Error types for serializer configuration and execution
//!
//! Field-level coercion and validation failures are not errors in this sense:
//! they are collected into [`ValidationErrors`](crate::validation::ValidationErrors)
//! and returned to the caller. The types here cover misconfiguration, which
//! must fail loudly.

use thiserror::Error;

/// Errors raised while serializing a resource or applying data onto one
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializerError {
	/// A readable field points at an attribute the resource does not have
	#[error("Attribute '{attribute}' required by field '{field}' is missing")]
	AttributeMissing { field: String, attribute: String },

	/// The resource refused to store a value under an attribute
	#[error("Attribute '{attribute}' cannot be set: {message}")]
	AttributeNotWritable { attribute: String, message: String },

	/// A value passed to a serializer is not an object-like resource
	#[error("Expected an object for serializer '{serializer}', got {found}")]
	NotAnObject { serializer: String, found: String },
}

impl SerializerError {
	/// Create an attribute-missing error
	pub fn attribute_missing(field: impl Into<String>, attribute: impl Into<String>) -> Self {
		SerializerError::AttributeMissing {
			field: field.into(),
			attribute: attribute.into(),
		}
	}

	/// Create an attribute-not-writable error
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::SerializerError;
	///
	/// let err = SerializerError::not_writable("id", "primary keys are immutable");
	/// assert_eq!(err.to_string(), "Attribute 'id' cannot be set: primary keys are immutable");
	/// ```
	pub fn not_writable(attribute: impl Into<String>, message: impl Into<String>) -> Self {
		SerializerError::AttributeNotWritable {
			attribute: attribute.into(),
			message: message.into(),
		}
	}

	/// Check if this is an attribute-missing error
	pub fn is_attribute_missing(&self) -> bool {
		matches!(self, SerializerError::AttributeMissing { .. })
	}
}

/// Malformed wire input for one field
///
/// Recovered by the serializer into a per-field validation message; it never
/// aborts the processing of sibling fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
	pub field: String,
	pub expected: String,
	/// Compact JSON rendering of the offending value
	pub value: String,
	/// Position of the offending item when coercing a list
	pub index: Option<usize>,
}

const MAX_RENDERED_VALUE: usize = 64;

impl CoercionError {
	/// Create a coercion error, rendering and truncating the offending value
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::CoercionError;
	/// use serde_json::json;
	///
	/// let err = CoercionError::new("age", "integer", &json!("abc"));
	/// assert_eq!(err.to_string(), "Invalid value for field 'age': expected integer, got \"abc\".");
	/// ```
	pub fn new(
		field: impl Into<String>,
		expected: impl Into<String>,
		value: &serde_json::Value,
	) -> Self {
		let mut rendered = value.to_string();
		if rendered.chars().count() > MAX_RENDERED_VALUE {
			rendered = rendered.chars().take(MAX_RENDERED_VALUE).collect::<String>() + "...";
		}
		Self {
			field: field.into(),
			expected: expected.into(),
			value: rendered,
			index: None,
		}
	}

	/// Mark the error as coming from one item of a list
	pub fn at_index(mut self, index: usize) -> Self {
		self.index = Some(index);
		self
	}
}

impl std::fmt::Display for CoercionError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.index {
			Some(index) => write!(
				f,
				"Invalid value for field '{}': expected {} at index {}, got {}.",
				self.field, self.expected, index, self.value
			),
			None => write!(
				f,
				"Invalid value for field '{}': expected {}, got {}.",
				self.field, self.expected, self.value
			),
		}
	}
}

impl std::error::Error for CoercionError {}

/// Errors detected while declaring fields, serializers or RPC actions
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
	#[error("Serializer '{serializer}' declares field '{field}' more than once")]
	DuplicateField { serializer: String, field: String },

	#[error("Field '{0}' can not be both read-only and required")]
	ReadOnlyRequired(String),

	#[error("Field '{0}' can not be both read-only and write-only")]
	ReadOnlyWriteOnly(String),

	#[error("Action '{0}' is already registered")]
	DuplicateAction(String),
}
