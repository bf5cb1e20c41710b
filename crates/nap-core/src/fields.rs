//! Field descriptors
//!
//! A [`Field`] describes one named attribute: where its value comes from on a
//! resource, how it converts to and from the wire, and which extra rules it
//! must satisfy. Fields are declared once with builder calls and never
//! mutated afterwards.

use crate::error::{CoercionError, SerializerError};
use crate::resource::Resource;
use crate::serializer::Serializer;
use crate::validation::{ErrorDetail, ValidationErrors};
use crate::validators::{Choices, Validator};
use crate::value::{NativeValue, WireValue};
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const NULL_MESSAGE: &str = "This field may not be null.";

/// Pair of conversions for a custom field type
///
/// `to_wire` must be deterministic and side-effect free; `from_wire`
/// returns `None` for malformed input.
pub trait Transform: Send + Sync {
	fn to_wire(&self, value: &NativeValue) -> WireValue;

	fn from_wire(&self, value: &WireValue) -> Option<NativeValue>;

	/// Description of the accepted input, used in coercion messages
	fn expected(&self) -> String {
		"valid value".to_string()
	}
}

/// Value type of a field, selecting its wire conversions
#[derive(Clone)]
pub enum FieldKind {
	/// Identity conversion
	Any,
	String,
	Integer,
	Float,
	Boolean,
	Date,
	DateTime,
	Uuid,
	/// Homogeneous list of another kind
	List(Box<FieldKind>),
	/// Sub-object handled by another serializer
	Nested(Arc<Serializer>),
	/// List of sub-objects handled by another serializer
	NestedMany(Arc<Serializer>),
	Custom(Arc<dyn Transform>),
}

impl FieldKind {
	/// Short description used in coercion messages
	pub fn describe(&self) -> String {
		match self {
			FieldKind::Any => "any value".to_string(),
			FieldKind::String => "string".to_string(),
			FieldKind::Integer => "integer".to_string(),
			FieldKind::Float => "number".to_string(),
			FieldKind::Boolean => "boolean".to_string(),
			FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
			FieldKind::DateTime => "datetime (RFC 3339)".to_string(),
			FieldKind::Uuid => "uuid".to_string(),
			FieldKind::List(inner) => format!("list of {}", inner.describe()),
			FieldKind::Nested(serializer) => format!("object ({})", serializer.name()),
			FieldKind::NestedMany(serializer) => format!("list of {}", serializer.name()),
			FieldKind::Custom(transform) => transform.expected(),
		}
	}

	fn to_wire(&self, value: &NativeValue) -> Result<WireValue, SerializerError> {
		if value.is_null() {
			return Ok(Value::Null);
		}
		match self {
			FieldKind::Nested(serializer) => match value {
				NativeValue::Object(record) => serializer.serialize(record).map(Value::Object),
				other => Err(not_an_object(serializer, other)),
			},
			FieldKind::NestedMany(serializer) => match value {
				NativeValue::List(items) => items
					.iter()
					.map(|item| match item {
						NativeValue::Object(record) => {
							serializer.serialize(record).map(Value::Object)
						}
						other => Err(not_an_object(serializer, other)),
					})
					.collect::<Result<Vec<_>, _>>()
					.map(Value::Array),
				other => Err(not_an_object(serializer, other)),
			},
			FieldKind::List(inner) => match value {
				NativeValue::List(items) => items
					.iter()
					.map(|item| inner.to_wire(item))
					.collect::<Result<Vec<_>, _>>()
					.map(Value::Array),
				other => Ok(other.to_wire()),
			},
			FieldKind::Custom(transform) => Ok(transform.to_wire(value)),
			_ => Ok(value.to_wire()),
		}
	}

	/// Coerce a scalar or list wire value; `Err` carries the offending item
	fn coerce<'a>(
		&self,
		value: &'a WireValue,
	) -> Result<NativeValue, (Option<usize>, &'a WireValue)> {
		let parsed = match (self, value) {
			(FieldKind::Any, v) => Some(NativeValue::from_wire(v)),
			(FieldKind::String, Value::String(s)) => Some(NativeValue::Text(s.clone())),
			(FieldKind::Integer, v) => coerce_integer(v),
			(FieldKind::Float, v) => coerce_float(v),
			(FieldKind::Boolean, v) => coerce_bool(v),
			(FieldKind::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
				.ok()
				.map(NativeValue::Date),
			(FieldKind::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
				.ok()
				.map(|dt| NativeValue::DateTime(dt.with_timezone(&Utc))),
			(FieldKind::Uuid, Value::String(s)) => Uuid::parse_str(s).ok().map(NativeValue::Uuid),
			(FieldKind::List(inner), Value::Array(items)) => {
				let mut coerced = Vec::with_capacity(items.len());
				for (index, item) in items.iter().enumerate() {
					match inner.coerce(item) {
						Ok(v) => coerced.push(v),
						Err((_, bad)) => return Err((Some(index), bad)),
					}
				}
				Some(NativeValue::List(coerced))
			}
			(FieldKind::Custom(transform), v) => transform.from_wire(v),
			_ => None,
		};
		parsed.ok_or((None, value))
	}
}

impl fmt::Debug for FieldKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "FieldKind({})", self.describe())
	}
}

fn not_an_object(serializer: &Serializer, found: &NativeValue) -> SerializerError {
	SerializerError::NotAnObject {
		serializer: serializer.name().to_string(),
		found: found.type_name().to_string(),
	}
}

fn coerce_integer(value: &WireValue) -> Option<NativeValue> {
	match value {
		Value::Number(n) if n.is_u64() => n.as_i64(),
		// i64::MAX as f64 is 2^63, one past the largest i64
		Value::Number(n) => n.as_i64().or_else(|| {
			n.as_f64()
				.filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
				.map(|f| f as i64)
		}),
		Value::String(s) => s.trim().parse::<i64>().ok(),
		_ => None,
	}
	.map(NativeValue::Int)
}

fn coerce_float(value: &WireValue) -> Option<NativeValue> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
		_ => None,
	}
	.map(NativeValue::Float)
}

fn coerce_bool(value: &WireValue) -> Option<NativeValue> {
	match value {
		Value::Bool(b) => Some(*b),
		Value::Number(n) => match n.as_i64() {
			Some(0) => Some(false),
			Some(1) => Some(true),
			_ => None,
		},
		Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" => Some(true),
			"false" | "0" | "no" => Some(false),
			_ => None,
		},
		_ => None,
	}
	.map(NativeValue::Bool)
}

/// Name of a wire value's JSON type, used in shape errors
pub(crate) fn wire_type_name(value: &WireValue) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "list",
		Value::Object(_) => "object",
	}
}

type MethodFn = dyn Fn(&dyn Resource) -> NativeValue + Send + Sync;

#[derive(Clone)]
enum Lookup {
	Attribute,
	/// Dotted path resolved through nested objects
	Path,
	Method(Arc<MethodFn>),
}

/// Declarative descriptor for one serialized attribute
#[derive(Clone)]
pub struct Field {
	name: String,
	source: Option<String>,
	kind: FieldKind,
	lookup: Lookup,
	read_only: bool,
	write_only: bool,
	required: bool,
	allow_null: bool,
	default: Option<NativeValue>,
	validators: Vec<Arc<dyn Validator>>,
}

impl Field {
	/// Create a writable, required field of the given kind
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{Field, FieldKind};
	///
	/// let field = Field::new("title", FieldKind::String);
	/// assert_eq!(field.name(), "title");
	/// assert_eq!(field.source_name(), "title");
	/// assert!(field.is_required());
	/// ```
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			source: None,
			kind,
			lookup: Lookup::Attribute,
			read_only: false,
			write_only: false,
			required: true,
			allow_null: false,
			default: None,
			validators: Vec::new(),
		}
	}

	pub fn any(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Any)
	}

	pub fn string(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::String)
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Integer)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Float)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Boolean)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Date)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::DateTime)
	}

	pub fn uuid(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Uuid)
	}

	/// List whose items all coerce as `item`
	pub fn list(name: impl Into<String>, item: FieldKind) -> Self {
		Self::new(name, FieldKind::List(Box::new(item)))
	}

	/// String field restricted to a fixed set of values
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::Field;
	///
	/// let status = Field::choice("status", ["draft", "published"]);
	/// assert_eq!(status.validator_count(), 1);
	/// ```
	pub fn choice<I, S>(name: impl Into<String>, choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::string(name).validator(Choices::new(choices))
	}

	/// Sub-object handled by `serializer`
	pub fn nested(name: impl Into<String>, serializer: Arc<Serializer>) -> Self {
		Self::new(name, FieldKind::Nested(serializer))
	}

	/// List of sub-objects handled by `serializer`
	pub fn nested_many(name: impl Into<String>, serializer: Arc<Serializer>) -> Self {
		Self::new(name, FieldKind::NestedMany(serializer))
	}

	pub fn custom(name: impl Into<String>, transform: Arc<dyn Transform>) -> Self {
		Self::new(name, FieldKind::Custom(transform))
	}

	/// Read-only field resolving a dotted path such as `author.name`
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, Field, NativeValue};
	///
	/// let field = Field::dig("author_name", "author.name");
	/// let post = record! { "author" => record! { "name" => "Ann" } };
	///
	/// assert!(field.is_read_only());
	/// assert_eq!(field.extract(&post).unwrap(), NativeValue::from("Ann"));
	/// ```
	pub fn dig(name: impl Into<String>, path: impl Into<String>) -> Self {
		let mut field = Self::any(name).source(path).read_only();
		field.lookup = Lookup::Path;
		field
	}

	/// Read-only field computed from the whole resource
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, Field, NativeValue, Resource};
	///
	/// let field = Field::method("initial", |resource: &dyn Resource| {
	///     resource
	///         .get_attr("name")
	///         .and_then(|name| name.as_str().and_then(|s| s.chars().next()))
	///         .map(|c| NativeValue::Text(c.to_string()))
	///         .unwrap_or_default()
	/// });
	/// let person = record! { "name" => "Ann" };
	///
	/// assert_eq!(field.extract(&person).unwrap(), NativeValue::from("A"));
	/// ```
	pub fn method<F>(name: impl Into<String>, method: F) -> Self
	where
		F: Fn(&dyn Resource) -> NativeValue + Send + Sync + 'static,
	{
		let mut field = Self::any(name).read_only();
		field.lookup = Lookup::Method(Arc::new(method));
		field
	}

	/// Read from and write to a differently named attribute
	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	/// Skip the field on deserialize; clears `required`
	pub fn read_only(mut self) -> Self {
		self.read_only = true;
		self.required = false;
		self
	}

	/// Skip the field on serialize
	pub fn write_only(mut self) -> Self {
		self.write_only = true;
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	/// Accept wire `null` as [`NativeValue::Null`]
	pub fn allow_null(mut self) -> Self {
		self.allow_null = true;
		self
	}

	/// Value used when the attribute is missing on serialize, or the key
	/// is absent on a full deserialize
	pub fn with_default(mut self, default: impl Into<NativeValue>) -> Self {
		self.default = Some(default.into());
		self
	}

	/// Attach a validator; every attached validator runs
	pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
		self.validators.push(Arc::new(validator));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Source attribute, defaulting to the field name
	pub fn source_name(&self) -> &str {
		self.source.as_deref().unwrap_or(&self.name)
	}

	pub fn kind(&self) -> &FieldKind {
		&self.kind
	}

	pub fn is_read_only(&self) -> bool {
		self.read_only
	}

	pub fn is_write_only(&self) -> bool {
		self.write_only
	}

	pub fn is_readable(&self) -> bool {
		!self.write_only
	}

	pub fn is_writable(&self) -> bool {
		!self.read_only
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn allows_null(&self) -> bool {
		self.allow_null
	}

	pub fn default_value(&self) -> Option<&NativeValue> {
		self.default.as_ref()
	}

	pub fn validator_count(&self) -> usize {
		self.validators.len()
	}

	/// Read the field's value from `resource`
	///
	/// Falls back to the declared default; fails with
	/// [`SerializerError::AttributeMissing`] when there is neither.
	pub fn extract(&self, resource: &dyn Resource) -> Result<NativeValue, SerializerError> {
		let value = match &self.lookup {
			Lookup::Attribute => resource.get_attr(self.source_name()),
			Lookup::Path => resource.dig(self.source_name()),
			Lookup::Method(method) => Some(method(resource)),
		};
		value
			.or_else(|| self.default.clone())
			.ok_or_else(|| SerializerError::attribute_missing(&self.name, self.source_name()))
	}

	/// Convert a native value to its wire form
	///
	/// Scalars never fail; nested kinds delegate to their serializer and
	/// propagate its errors.
	pub fn to_wire(&self, value: &NativeValue) -> Result<WireValue, SerializerError> {
		self.kind.to_wire(value)
	}

	/// Coerce a wire value into the field's native type
	///
	/// Nested kinds run a full deserialize of the sub-object; a failure is
	/// reported as a single coercion error here. Serializers keep the
	/// per-field structure of nested failures instead.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{Field, NativeValue};
	/// use serde_json::json;
	///
	/// let age = Field::integer("age");
	/// assert_eq!(age.from_wire(&json!("42")).unwrap(), NativeValue::Int(42));
	/// assert!(age.from_wire(&json!("forty")).is_err());
	/// ```
	pub fn from_wire(&self, value: &WireValue) -> Result<NativeValue, CoercionError> {
		match &self.kind {
			FieldKind::Nested(_) | FieldKind::NestedMany(_) => self
				.coerce_nested(value)
				.map_err(|_| CoercionError::new(&self.name, self.kind.describe(), value)),
			kind => kind.coerce(value).map_err(|(index, bad)| {
				let expected = match (kind, index) {
					(FieldKind::List(inner), Some(_)) => inner.describe(),
					_ => kind.describe(),
				};
				let err = CoercionError::new(&self.name, expected, bad);
				match index {
					Some(i) => err.at_index(i),
					None => err,
				}
			}),
		}
	}

	/// Run every validator, collecting all messages
	pub fn validate(&self, value: &NativeValue) -> Result<(), Vec<String>> {
		let messages: Vec<String> = self
			.validators
			.iter()
			.filter_map(|validator| validator.validate(value).err())
			.collect();
		if messages.is_empty() {
			Ok(())
		} else {
			Err(messages)
		}
	}

	/// Null check, coercion and validation of one present wire value
	///
	/// Nested serializers always run in full mode here: a nested value
	/// without a stored object to merge into replaces it whole.
	pub(crate) fn clean(&self, value: &WireValue) -> Result<NativeValue, ErrorDetail> {
		if value.is_null() {
			return if self.allow_null {
				Ok(NativeValue::Null)
			} else {
				Err(ErrorDetail::Messages(vec![NULL_MESSAGE.to_string()]))
			};
		}
		let native = match &self.kind {
			FieldKind::Nested(_) | FieldKind::NestedMany(_) => self.coerce_nested(value)?,
			_ => self
				.from_wire(value)
				.map_err(|err| ErrorDetail::Messages(vec![err.to_string()]))?,
		};
		self.validate(&native).map_err(ErrorDetail::Messages)?;
		Ok(native)
	}

	/// Like [`clean`](Self::clean), but a nested object is merged into the
	/// stored sub-object `current` and only the merged result is accepted
	pub(crate) fn clean_patch(
		&self,
		value: &WireValue,
		current: Option<NativeValue>,
	) -> Result<NativeValue, ErrorDetail> {
		match (&self.kind, value, current) {
			(
				FieldKind::Nested(serializer),
				Value::Object(object),
				Some(NativeValue::Object(mut stored)),
			) => {
				let patch = serializer
					.deserialize_patch(object, &stored)
					.map_err(ErrorDetail::Nested)?;
				patch
					.apply_to(&mut stored)
					.map_err(|err| ErrorDetail::Messages(vec![err.to_string()]))?;
				let merged = NativeValue::Object(stored);
				self.validate(&merged).map_err(ErrorDetail::Messages)?;
				Ok(merged)
			}
			_ => self.clean(value),
		}
	}

	fn coerce_nested(&self, value: &WireValue) -> Result<NativeValue, ErrorDetail> {
		match (&self.kind, value) {
			(FieldKind::Nested(serializer), Value::Object(object)) => serializer
				.deserialize(object, false)
				.map(|data| NativeValue::Object(data.into_record()))
				.map_err(ErrorDetail::Nested),
			(FieldKind::NestedMany(serializer), Value::Array(items)) => {
				let mut records = Vec::with_capacity(items.len());
				let mut failures: IndexMap<usize, ValidationErrors> = IndexMap::new();
				for (index, item) in items.iter().enumerate() {
					match item {
						Value::Object(object) => match serializer.deserialize(object, false) {
							Ok(data) => records.push(NativeValue::Object(data.into_record())),
							Err(errors) => {
								failures.insert(index, errors);
							}
						},
						other => {
							let mut errors = ValidationErrors::new();
							errors.add_non_field(format!(
								"Expected an object, got {}.",
								wire_type_name(other)
							));
							failures.insert(index, errors);
						}
					}
				}
				if failures.is_empty() {
					Ok(NativeValue::List(records))
				} else {
					Err(ErrorDetail::Items(failures))
				}
			}
			(FieldKind::NestedMany(_), other) => Err(ErrorDetail::Messages(vec![format!(
				"Expected a list, got {}.",
				wire_type_name(other)
			)])),
			(_, other) => Err(ErrorDetail::Messages(vec![format!(
				"Expected an object, got {}.",
				wire_type_name(other)
			)])),
		}
	}
}

impl fmt::Debug for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("source", &self.source_name())
			.field("kind", &self.kind)
			.field("read_only", &self.read_only)
			.field("write_only", &self.write_only)
			.field("required", &self.required)
			.field("allow_null", &self.allow_null)
			.field("validators", &self.validators.len())
			.finish()
	}
}
