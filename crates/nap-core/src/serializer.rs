//! Ordered field collections that convert resources to and from wire objects
//!
//! A [`Serializer`] is declared once through [`SerializerBuilder`] and shared
//! read-only afterwards (typically behind an `Arc`). Every call works on
//! request-scoped values only.

use crate::error::{DeclarationError, SerializerError};
use crate::fields::{wire_type_name, Field, REQUIRED_MESSAGE};
use crate::resource::Resource;
use crate::validation::{ErrorDetail, ValidatedData, ValidationErrors};
use crate::value::{WireObject, WireValue};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Rule checked against the complete set of validated values
pub type ObjectValidator = dyn Fn(&ValidatedData) -> Result<(), String> + Send + Sync;

/// Bidirectional converter between resources and wire objects
#[derive(Clone)]
pub struct Serializer {
	name: String,
	fields: Vec<Field>,
	reject_unknown: bool,
	object_validators: Vec<Arc<ObjectValidator>>,
}

impl Serializer {
	/// Start declaring a serializer
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::validators::MinValue;
	/// use nap_core::{Field, Serializer};
	///
	/// let serializer = Serializer::builder("PersonSerializer")
	///     .field(Field::string("name"))
	///     .field(Field::integer("age").validator(MinValue::new(0)))
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(serializer.fields().len(), 2);
	/// ```
	pub fn builder(name: impl Into<String>) -> SerializerBuilder {
		SerializerBuilder {
			name: name.into(),
			fields: Vec::new(),
			reject_unknown: false,
			object_validators: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Fields in declaration order
	pub fn fields(&self) -> &[Field] {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|f| f.name() == name)
	}

	/// Fields emitted by `serialize`
	pub fn readable_fields(&self) -> impl Iterator<Item = &Field> {
		self.fields.iter().filter(|f| f.is_readable())
	}

	/// Fields consumed by `deserialize`
	pub fn writable_fields(&self) -> impl Iterator<Item = &Field> {
		self.fields.iter().filter(|f| f.is_writable())
	}

	/// Whether unknown input keys are rejected
	pub fn rejects_unknown_fields(&self) -> bool {
		self.reject_unknown
	}

	/// Convert a resource into a wire object
	///
	/// Keys follow declaration order. A missing attribute becomes `null` for
	/// optional fields and fails with [`SerializerError::AttributeMissing`]
	/// for required ones.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, Field, Serializer};
	/// use serde_json::{json, Value};
	///
	/// let serializer = Serializer::builder("PersonSerializer")
	///     .field(Field::string("name"))
	///     .field(Field::string("nickname").optional())
	///     .build()
	///     .unwrap();
	///
	/// let wire = serializer.serialize(&record! { "name" => "Ann" }).unwrap();
	/// assert_eq!(Value::Object(wire), json!({"name": "Ann", "nickname": null}));
	/// ```
	pub fn serialize(&self, resource: &dyn Resource) -> Result<WireObject, SerializerError> {
		let mut output = WireObject::new();
		for field in self.readable_fields() {
			let wire = match field.extract(resource) {
				Ok(value) => field.to_wire(&value)?,
				Err(err) if err.is_attribute_missing() && !field.is_required() => Value::Null,
				Err(err) => {
					tracing::error!(
						serializer = %self.name,
						field = field.name(),
						error = %err,
						"serializer field points at a missing attribute"
					);
					return Err(err);
				}
			};
			output.insert(field.name().to_string(), wire);
		}
		Ok(output)
	}

	/// Serialize every resource, stopping at the first failure
	pub fn serialize_many<R: Resource>(
		&self,
		resources: &[R],
	) -> Result<Vec<WireObject>, SerializerError> {
		resources.iter().map(|r| self.serialize(r)).collect()
	}

	/// Coerce and validate a wire object
	///
	/// Every writable field is processed even after a failure, so the
	/// returned [`ValidationErrors`] lists all failing fields at once. With
	/// `partial` set, absent fields are skipped instead of reported as
	/// required.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::validators::MinValue;
	/// use nap_core::{Field, Serializer};
	/// use serde_json::{json, Value};
	///
	/// let serializer = Serializer::builder("PersonSerializer")
	///     .field(Field::string("name"))
	///     .field(Field::integer("age").validator(MinValue::new(0)))
	///     .build()
	///     .unwrap();
	///
	/// let input = json!({"name": "Ann", "age": -1});
	/// let errors = serializer
	///     .deserialize(input.as_object().unwrap(), false)
	///     .unwrap_err();
	/// assert_eq!(Value::Object(errors.to_wire()), json!({"age": ["must be >= 0"]}));
	/// ```
	pub fn deserialize(
		&self,
		data: &WireObject,
		partial: bool,
	) -> Result<ValidatedData, ValidationErrors> {
		self.run_deserialize(data, partial, None)
	}

	/// Partially deserialize a wire object as a patch over `current`
	///
	/// Absent fields are skipped as with `deserialize(data, true)`. A nested
	/// object is merged into the sub-object `current` already holds and the
	/// merged result is validated, so the returned data never carries an
	/// incomplete sub-object. When there is no stored sub-object the nested
	/// value must be complete.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, Field, NativeValue, Resource, Serializer};
	/// use serde_json::json;
	/// use std::sync::Arc;
	///
	/// let address = Serializer::builder("AddressSerializer")
	///     .field(Field::string("city"))
	///     .field(Field::string("zip"))
	///     .build()
	///     .unwrap();
	/// let person = Serializer::builder("PersonSerializer")
	///     .field(Field::nested("address", Arc::new(address)).allow_null())
	///     .build()
	///     .unwrap();
	///
	/// let mut stored = record! { "address" => record! { "city" => "Berlin", "zip" => "10115" } };
	/// let patch = json!({"address": {"zip": "10117"}});
	/// let data = person.deserialize_patch(patch.as_object().unwrap(), &stored).unwrap();
	/// data.apply_to(&mut stored).unwrap();
	/// assert_eq!(stored.dig("address.city"), Some(NativeValue::from("Berlin")));
	/// assert_eq!(stored.dig("address.zip"), Some(NativeValue::from("10117")));
	///
	/// let empty = record! { "address" => NativeValue::Null };
	/// let errors = person.deserialize_patch(patch.as_object().unwrap(), &empty).unwrap_err();
	/// assert!(errors.nested("address").is_some());
	/// ```
	pub fn deserialize_patch(
		&self,
		data: &WireObject,
		current: &dyn Resource,
	) -> Result<ValidatedData, ValidationErrors> {
		self.run_deserialize(data, true, Some(current))
	}

	fn run_deserialize(
		&self,
		data: &WireObject,
		partial: bool,
		current: Option<&dyn Resource>,
	) -> Result<ValidatedData, ValidationErrors> {
		let mut errors = ValidationErrors::new();
		let mut validated = ValidatedData::new(partial);

		if self.reject_unknown {
			for key in data.keys() {
				if self.field(key).is_none() {
					errors.add_non_field(format!("Unknown field '{}'.", key));
				}
			}
		}

		for field in self.writable_fields() {
			match data.get(field.name()) {
				None if partial => {}
				None => match field.default_value() {
					Some(default) => validated.insert(field.source_name(), default.clone()),
					None if field.is_required() => errors.add(field.name(), REQUIRED_MESSAGE),
					None => {}
				},
				Some(value) => {
					let cleaned = match current {
						Some(resource) => {
							field.clean_patch(value, resource.get_attr(field.source_name()))
						}
						None => field.clean(value),
					};
					match cleaned {
						Ok(native) => validated.insert(field.source_name(), native),
						Err(ErrorDetail::Nested(nested)) => errors.add_nested(field.name(), nested),
						Err(ErrorDetail::Items(items)) => {
							for (index, item) in items {
								errors.add_item(field.name(), index, item);
							}
						}
						Err(detail) => errors.insert(field.name(), detail),
					}
				}
			}
		}

		if errors.is_empty() {
			for validator in &self.object_validators {
				if let Err(message) = validator(&validated) {
					errors.add_non_field(message);
				}
			}
		}

		if errors.is_empty() {
			tracing::debug!(
				serializer = %self.name,
				partial,
				fields = validated.len(),
				"deserialize succeeded"
			);
			Ok(validated)
		} else {
			tracing::debug!(
				serializer = %self.name,
				partial,
				failed = %errors,
				"deserialize failed"
			);
			Err(errors)
		}
	}

	/// Deserialize an arbitrary wire value, rejecting anything but an object
	pub fn deserialize_value(
		&self,
		data: &WireValue,
		partial: bool,
	) -> Result<ValidatedData, ValidationErrors> {
		match data {
			Value::Object(object) => self.deserialize(object, partial),
			other => {
				let mut errors = ValidationErrors::new();
				errors.add_non_field(format!(
					"Expected an object, got {}.",
					wire_type_name(other)
				));
				Err(errors)
			}
		}
	}

	/// Set validated values onto a resource through each field's source name
	pub fn apply(
		&self,
		resource: &mut dyn Resource,
		data: &ValidatedData,
	) -> Result<(), SerializerError> {
		data.apply_to(resource)
	}
}

impl fmt::Debug for Serializer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Serializer")
			.field("name", &self.name)
			.field("fields", &self.fields)
			.field("reject_unknown", &self.reject_unknown)
			.field("object_validators", &self.object_validators.len())
			.finish()
	}
}

/// Builder collecting field declarations for a [`Serializer`]
pub struct SerializerBuilder {
	name: String,
	fields: Vec<Field>,
	reject_unknown: bool,
	object_validators: Vec<Arc<ObjectValidator>>,
}

impl SerializerBuilder {
	pub fn field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
		self.fields.extend(fields);
		self
	}

	/// Report input keys that match no declared field
	pub fn reject_unknown_fields(mut self) -> Self {
		self.reject_unknown = true;
		self
	}

	/// Add a rule over the whole validated object
	///
	/// Runs only when every field passed; failures are reported under
	/// [`NON_FIELD_ERRORS_KEY`](crate::validation::NON_FIELD_ERRORS_KEY).
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{Field, Serializer};
	/// use serde_json::json;
	///
	/// let serializer = Serializer::builder("RangeSerializer")
	///     .field(Field::integer("low"))
	///     .field(Field::integer("high"))
	///     .validate_object(|data| {
	///         let low = data.get("low").and_then(|v| v.as_i64());
	///         let high = data.get("high").and_then(|v| v.as_i64());
	///         match (low, high) {
	///             (Some(l), Some(h)) if l > h => Err("low must not exceed high".to_string()),
	///             _ => Ok(()),
	///         }
	///     })
	///     .build()
	///     .unwrap();
	///
	/// let input = json!({"low": 5, "high": 1});
	/// let errors = serializer.deserialize(input.as_object().unwrap(), false).unwrap_err();
	/// assert_eq!(errors.non_field_errors().unwrap(), ["low must not exceed high"]);
	/// ```
	pub fn validate_object<F>(mut self, validator: F) -> Self
	where
		F: Fn(&ValidatedData) -> Result<(), String> + Send + Sync + 'static,
	{
		self.object_validators.push(Arc::new(validator));
		self
	}

	/// Check the declarations and freeze the serializer
	pub fn build(self) -> Result<Serializer, DeclarationError> {
		let mut seen = HashSet::new();
		for field in &self.fields {
			if !seen.insert(field.name()) {
				return Err(DeclarationError::DuplicateField {
					serializer: self.name.clone(),
					field: field.name().to_string(),
				});
			}
			if field.is_read_only() && field.is_required() {
				return Err(DeclarationError::ReadOnlyRequired(field.name().to_string()));
			}
			if field.is_read_only() && field.is_write_only() {
				return Err(DeclarationError::ReadOnlyWriteOnly(field.name().to_string()));
			}
		}
		Ok(Serializer {
			name: self.name,
			fields: self.fields,
			reject_unknown: self.reject_unknown,
			object_validators: self.object_validators,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record;
	use crate::value::NativeValue;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn person() -> Serializer {
		Serializer::builder("PersonSerializer")
			.field(Field::integer("id").read_only())
			.field(Field::string("name"))
			.field(Field::string("password").write_only())
			.field(Field::string("bio").optional().allow_null())
			.build()
			.unwrap()
	}

	fn object(value: Value) -> WireObject {
		match value {
			Value::Object(map) => map,
			_ => panic!("expected an object literal"),
		}
	}

	#[rstest]
	fn test_duplicate_field_is_rejected() {
		let result = Serializer::builder("Dup")
			.field(Field::string("name"))
			.field(Field::integer("name"))
			.build();

		assert_eq!(
			result.unwrap_err(),
			DeclarationError::DuplicateField {
				serializer: "Dup".to_string(),
				field: "name".to_string(),
			}
		);
	}

	#[rstest]
	fn test_read_only_required_is_rejected() {
		let result = Serializer::builder("Bad")
			.field(Field::integer("id").read_only().required())
			.build();

		assert_eq!(
			result.unwrap_err(),
			DeclarationError::ReadOnlyRequired("id".to_string())
		);
	}

	#[rstest]
	fn test_serialize_skips_write_only(person: Serializer) {
		let resource = record! { "id" => 1, "name" => "Ann", "password" => "secret" };

		let wire = person.serialize(&resource).unwrap();

		assert_eq!(
			Value::Object(wire),
			json!({"id": 1, "name": "Ann", "bio": null})
		);
	}

	#[rstest]
	fn test_serialize_propagates_missing_required_attribute(person: Serializer) {
		let resource = record! { "id" => 1 };

		let err = person.serialize(&resource).unwrap_err();

		assert_eq!(err, SerializerError::attribute_missing("name", "name"));
	}

	#[rstest]
	fn test_deserialize_ignores_read_only_input(person: Serializer) {
		let input = object(json!({"id": 99, "name": "Ann", "password": "pw"}));

		let data = person.deserialize(&input, false).unwrap();

		assert!(!data.contains("id"));
		assert_eq!(data.get("password"), Some(&NativeValue::from("pw")));
	}

	#[rstest]
	fn test_deserialize_reports_required_fields(person: Serializer) {
		let errors = person.deserialize(&WireObject::new(), false).unwrap_err();

		assert_eq!(
			Value::Object(errors.to_wire()),
			json!({
				"name": ["This field is required."],
				"password": ["This field is required."],
			})
		);
	}

	#[rstest]
	fn test_partial_deserialize_skips_absent_fields(person: Serializer) {
		let input = object(json!({"bio": null}));

		let data = person.deserialize(&input, true).unwrap();

		assert!(data.is_partial());
		assert_eq!(data.len(), 1);
		assert_eq!(data.get("bio"), Some(&NativeValue::Null));
	}

	#[rstest]
	fn test_default_fills_absent_field() {
		let serializer = Serializer::builder("Settings")
			.field(Field::boolean("enabled").with_default(true))
			.build()
			.unwrap();

		let full = serializer.deserialize(&WireObject::new(), false).unwrap();
		let partial = serializer.deserialize(&WireObject::new(), true).unwrap();

		assert_eq!(full.get("enabled"), Some(&NativeValue::Bool(true)));
		assert!(partial.is_empty());
	}

	#[rstest]
	fn test_values_are_keyed_by_source() {
		let serializer = Serializer::builder("Post")
			.field(Field::string("title").source("headline"))
			.build()
			.unwrap();
		let input = object(json!({"title": "Hello"}));

		let data = serializer.deserialize(&input, false).unwrap();

		assert_eq!(data.get("headline"), Some(&NativeValue::from("Hello")));
	}

	#[rstest]
	fn test_strict_mode_reports_unknown_keys() {
		let serializer = Serializer::builder("Tag")
			.field(Field::integer("id").read_only())
			.field(Field::string("label"))
			.reject_unknown_fields()
			.build()
			.unwrap();
		let input = object(json!({"id": 3, "label": "rust", "colour": "red"}));

		let errors = serializer.deserialize(&input, false).unwrap_err();

		assert_eq!(
			errors.non_field_errors().unwrap(),
			["Unknown field 'colour'."]
		);
	}

	#[rstest]
	fn test_object_validators_wait_for_field_errors() {
		let serializer = Serializer::builder("Range")
			.field(Field::integer("low"))
			.validate_object(|_| Err("never reached".to_string()))
			.build()
			.unwrap();
		let input = object(json!({"low": "abc"}));

		let errors = serializer.deserialize(&input, false).unwrap_err();

		assert!(errors.non_field_errors().is_none());
		assert!(errors.contains("low"));
	}

	#[rstest]
	#[case(json!([1, 2]), "Expected an object, got list.")]
	#[case(json!("text"), "Expected an object, got string.")]
	fn test_deserialize_value_requires_object(#[case] input: Value, #[case] message: &str) {
		let serializer = Serializer::builder("Empty").build().unwrap();

		let errors = serializer.deserialize_value(&input, false).unwrap_err();

		assert_eq!(errors.non_field_errors().unwrap(), [message]);
	}

	#[rstest]
	fn test_apply_sets_values_on_resource(person: Serializer) {
		// Arrange
		let mut resource = record! { "id" => 1, "name" => "Ann", "bio" => "hi" };
		let input = object(json!({"name": "Bea"}));
		let data = person.deserialize(&input, true).unwrap();

		// Act
		person.apply(&mut resource, &data).unwrap();

		// Assert
		assert_eq!(resource.get("name"), Some(&NativeValue::from("Bea")));
		assert_eq!(resource.get("bio"), Some(&NativeValue::from("hi")));
	}
}
