//! Aggregated validation outcome of a deserialize call
//!
//! A deserialize call either produces [`ValidatedData`] (every field coerced
//! and validated) or a single [`ValidationErrors`] value listing every field
//! that failed. Nested serializer failures nest as mappings, never as dotted
//! keys, so the error shape mirrors the input shape.

use crate::error::SerializerError;
use crate::resource::Resource;
use crate::value::{NativeValue, Record, WireObject};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Key for errors that do not belong to a single field
///
/// Object-level validators and unknown input keys report under this key.
pub const NON_FIELD_ERRORS_KEY: &str = "_all";

/// Errors recorded for one field
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
	/// Coercion, required, null or validator messages for a scalar field
	Messages(Vec<String>),
	/// Errors of a nested serializer
	Nested(ValidationErrors),
	/// Errors of a list of nested objects, keyed by item index
	Items(IndexMap<usize, ValidationErrors>),
}

impl ErrorDetail {
	fn to_wire(&self) -> Value {
		match self {
			ErrorDetail::Messages(messages) => {
				Value::Array(messages.iter().cloned().map(Value::String).collect())
			}
			ErrorDetail::Nested(errors) => Value::Object(errors.to_wire()),
			ErrorDetail::Items(items) => Value::Object(
				items
					.iter()
					.map(|(index, errors)| (index.to_string(), Value::Object(errors.to_wire())))
					.collect(),
			),
		}
	}
}

/// Field name to error mapping returned when any field fails
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors {
	errors: IndexMap<String, ErrorDetail>,
}

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Number of keys carrying errors
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// Append a message for a field
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::ValidationErrors;
	///
	/// let mut errors = ValidationErrors::new();
	/// errors.add("age", "must be >= 0");
	/// errors.add("age", "must be even");
	/// assert_eq!(errors.messages("age").unwrap().len(), 2);
	/// ```
	///
	/// A message added to a nested entry lands under the nested non-field
	/// key; one added to a list entry replaces its item errors.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		let message = message.into();
		let detail = self
			.errors
			.entry(field.into())
			.or_insert_with(|| ErrorDetail::Messages(Vec::new()));
		match detail {
			ErrorDetail::Messages(messages) => messages.push(message),
			ErrorDetail::Nested(nested) => nested.add_non_field(message),
			items @ ErrorDetail::Items(_) => *items = ErrorDetail::Messages(vec![message]),
		}
	}

	/// Replace the errors recorded for a field
	pub fn insert(&mut self, field: impl Into<String>, detail: ErrorDetail) {
		self.errors.insert(field.into(), detail);
	}

	/// Record the errors of a nested serializer under the parent field
	pub fn add_nested(&mut self, field: impl Into<String>, errors: ValidationErrors) {
		if !errors.is_empty() {
			self.errors.insert(field.into(), ErrorDetail::Nested(errors));
		}
	}

	/// Record the errors of one item of a nested list
	pub fn add_item(&mut self, field: impl Into<String>, index: usize, errors: ValidationErrors) {
		if errors.is_empty() {
			return;
		}
		let entry = self
			.errors
			.entry(field.into())
			.or_insert_with(|| ErrorDetail::Items(IndexMap::new()));
		if let ErrorDetail::Items(items) = entry {
			items.insert(index, errors);
		}
	}

	/// Append an error that does not belong to a single field
	pub fn add_non_field(&mut self, message: impl Into<String>) {
		self.add(NON_FIELD_ERRORS_KEY, message);
	}

	pub fn get(&self, field: &str) -> Option<&ErrorDetail> {
		self.errors.get(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.errors.contains_key(field)
	}

	/// Messages of a scalar field, `None` for nested entries
	pub fn messages(&self, field: &str) -> Option<&[String]> {
		match self.errors.get(field)? {
			ErrorDetail::Messages(messages) => Some(messages),
			_ => None,
		}
	}

	/// Errors of a nested serializer field
	pub fn nested(&self, field: &str) -> Option<&ValidationErrors> {
		match self.errors.get(field)? {
			ErrorDetail::Nested(errors) => Some(errors),
			_ => None,
		}
	}

	/// Errors of one item of a nested list field
	pub fn item(&self, field: &str, index: usize) -> Option<&ValidationErrors> {
		match self.errors.get(field)? {
			ErrorDetail::Items(items) => items.get(&index),
			_ => None,
		}
	}

	pub fn non_field_errors(&self) -> Option<&[String]> {
		self.messages(NON_FIELD_ERRORS_KEY)
	}

	/// Names of the fields with errors, in the order they were recorded
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorDetail)> {
		self.errors.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Render as a wire mapping
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::ValidationErrors;
	/// use serde_json::{json, Value};
	///
	/// let mut address = ValidationErrors::new();
	/// address.add("zip", "This field is required.");
	/// let mut errors = ValidationErrors::new();
	/// errors.add("age", "must be >= 0");
	/// errors.add_nested("address", address);
	///
	/// assert_eq!(
	///     Value::Object(errors.to_wire()),
	///     json!({"age": ["must be >= 0"], "address": {"zip": ["This field is required."]}})
	/// );
	/// ```
	pub fn to_wire(&self) -> WireObject {
		self.errors
			.iter()
			.map(|(field, detail)| (field.clone(), detail.to_wire()))
			.collect()
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let fields: Vec<&str> = self.fields().collect();
		write!(f, "Validation failed for: {}", fields.join(", "))
	}
}

impl std::error::Error for ValidationErrors {}

/// Coerced values of a successful deserialize call
///
/// Keys are source attribute names, so the data can be applied directly
/// onto a resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedData {
	values: IndexMap<String, NativeValue>,
	partial: bool,
}

impl ValidatedData {
	pub fn new(partial: bool) -> Self {
		Self {
			values: IndexMap::new(),
			partial,
		}
	}

	/// Whether the data came from a partial deserialize
	pub fn is_partial(&self) -> bool {
		self.partial
	}

	pub fn insert(&mut self, attribute: impl Into<String>, value: NativeValue) {
		self.values.insert(attribute.into(), value);
	}

	pub fn get(&self, attribute: &str) -> Option<&NativeValue> {
		self.values.get(attribute)
	}

	pub fn contains(&self, attribute: &str) -> bool {
		self.values.contains_key(attribute)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Copy the values into a fresh [`Record`]
	pub fn to_record(&self) -> Record {
		self.values
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	pub fn into_record(self) -> Record {
		self.values.into_iter().collect()
	}

	/// Set every value onto `resource`
	///
	/// Partial data only touches the attributes it carries. Nested objects
	/// are set whole; [`Serializer::deserialize_patch`] has already merged
	/// them with the stored sub-object.
	///
	/// [`Serializer::deserialize_patch`]: crate::Serializer::deserialize_patch
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, NativeValue, Resource, ValidatedData};
	///
	/// let mut post = record! { "title" => "Old", "body" => "Text" };
	/// let mut data = ValidatedData::new(true);
	/// data.insert("title", NativeValue::from("New"));
	///
	/// data.apply_to(&mut post).unwrap();
	/// assert_eq!(post.get_attr("title"), Some(NativeValue::from("New")));
	/// assert_eq!(post.get_attr("body"), Some(NativeValue::from("Text")));
	/// ```
	pub fn apply_to<R: Resource + ?Sized>(&self, resource: &mut R) -> Result<(), SerializerError> {
		for (attribute, value) in &self.values {
			resource.set_attr(attribute, value.clone())?;
		}
		Ok(())
	}
}
