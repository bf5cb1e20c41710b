//! Native values and the generic [`Record`] resource
//!
//! A [`NativeValue`] is what a field extracts from a resource and what
//! deserialization hands back to the caller. [`WireValue`] and [`WireObject`]
//! are the transport-safe side of the same data.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Transport-safe value produced and consumed by serializers
pub type WireValue = Value;

/// Ordered mapping from field name to wire value
///
/// Key order is insertion order, so serializers emit keys in field
/// declaration order.
pub type WireObject = Map<String, Value>;

/// In-memory value read from or written to a resource attribute
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NativeValue {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
	Uuid(Uuid),
	List(Vec<NativeValue>),
	Object(Record),
}

impl NativeValue {
	/// Convert to the wire representation without any field-specific transform
	///
	/// Dates are rendered as `YYYY-MM-DD`, datetimes as RFC 3339 in UTC and
	/// UUIDs in hyphenated form. Non-finite floats become `null`.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::value::NativeValue;
	/// use serde_json::json;
	///
	/// let value = NativeValue::List(vec![NativeValue::Int(1), NativeValue::from("a")]);
	/// assert_eq!(value.to_wire(), json!([1, "a"]));
	/// ```
	pub fn to_wire(&self) -> WireValue {
		match self {
			NativeValue::Null => Value::Null,
			NativeValue::Bool(b) => Value::Bool(*b),
			NativeValue::Int(i) => Value::from(*i),
			NativeValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
			NativeValue::Text(s) => Value::String(s.clone()),
			NativeValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
			NativeValue::DateTime(dt) => {
				Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
			}
			NativeValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
			NativeValue::List(items) => Value::Array(items.iter().map(Self::to_wire).collect()),
			NativeValue::Object(record) => Value::Object(record.to_wire()),
		}
	}

	/// Build a native value from an arbitrary wire value
	///
	/// Integral numbers that fit in `i64` become [`NativeValue::Int`], every
	/// other number becomes [`NativeValue::Float`]. Strings are never parsed
	/// into dates or UUIDs here; that is the job of typed fields.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::value::NativeValue;
	/// use serde_json::json;
	///
	/// assert_eq!(NativeValue::from_wire(&json!(3)), NativeValue::Int(3));
	/// assert_eq!(NativeValue::from_wire(&json!(1.5)), NativeValue::Float(1.5));
	/// ```
	pub fn from_wire(value: &WireValue) -> Self {
		match value {
			Value::Null => NativeValue::Null,
			Value::Bool(b) => NativeValue::Bool(*b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => NativeValue::Int(i),
				None => NativeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			Value::String(s) => NativeValue::Text(s.clone()),
			Value::Array(items) => NativeValue::List(items.iter().map(Self::from_wire).collect()),
			Value::Object(map) => NativeValue::Object(Record::from_wire(map)),
		}
	}

	/// Short name of the variant, used in error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			NativeValue::Null => "null",
			NativeValue::Bool(_) => "boolean",
			NativeValue::Int(_) => "integer",
			NativeValue::Float(_) => "float",
			NativeValue::Text(_) => "string",
			NativeValue::Date(_) => "date",
			NativeValue::DateTime(_) => "datetime",
			NativeValue::Uuid(_) => "uuid",
			NativeValue::List(_) => "list",
			NativeValue::Object(_) => "object",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, NativeValue::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			NativeValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			NativeValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Numeric view of the value; integers are widened
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			NativeValue::Int(i) => Some(*i as f64),
			NativeValue::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			NativeValue::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[NativeValue]> {
		match self {
			NativeValue::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_record(&self) -> Option<&Record> {
		match self {
			NativeValue::Object(record) => Some(record),
			_ => None,
		}
	}

	/// String used when comparing a value against a query parameter
	///
	/// Text is returned without quotes; everything else uses its wire form.
	pub fn to_query_string(&self) -> String {
		match self {
			NativeValue::Text(s) => s.clone(),
			other => match other.to_wire() {
				Value::String(s) => s,
				wire => wire.to_string(),
			},
		}
	}
}

impl From<bool> for NativeValue {
	fn from(value: bool) -> Self {
		NativeValue::Bool(value)
	}
}

impl From<i64> for NativeValue {
	fn from(value: i64) -> Self {
		NativeValue::Int(value)
	}
}

impl From<i32> for NativeValue {
	fn from(value: i32) -> Self {
		NativeValue::Int(i64::from(value))
	}
}

impl From<u32> for NativeValue {
	fn from(value: u32) -> Self {
		NativeValue::Int(i64::from(value))
	}
}

impl From<f64> for NativeValue {
	fn from(value: f64) -> Self {
		NativeValue::Float(value)
	}
}

impl From<&str> for NativeValue {
	fn from(value: &str) -> Self {
		NativeValue::Text(value.to_string())
	}
}

impl From<String> for NativeValue {
	fn from(value: String) -> Self {
		NativeValue::Text(value)
	}
}

impl From<NaiveDate> for NativeValue {
	fn from(value: NaiveDate) -> Self {
		NativeValue::Date(value)
	}
}

impl From<DateTime<Utc>> for NativeValue {
	fn from(value: DateTime<Utc>) -> Self {
		NativeValue::DateTime(value)
	}
}

impl From<Uuid> for NativeValue {
	fn from(value: Uuid) -> Self {
		NativeValue::Uuid(value)
	}
}

impl From<Record> for NativeValue {
	fn from(value: Record) -> Self {
		NativeValue::Object(value)
	}
}

impl From<Vec<NativeValue>> for NativeValue {
	fn from(value: Vec<NativeValue>) -> Self {
		NativeValue::List(value)
	}
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(NativeValue::Null, Into::into)
	}
}

/// Ordered attribute bag used as a generic resource object
///
/// Nested sub-objects, RPC payloads and the in-memory store all use
/// `Record`. Attribute order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
	attrs: IndexMap<String, NativeValue>,
}

impl Record {
	/// Create an empty record
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::value::Record;
	///
	/// let record = Record::new();
	/// assert!(record.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::value::{NativeValue, Record};
	///
	/// let record = Record::new().with("name", "Ann").with("age", 31);
	/// assert_eq!(record.get("age"), Some(&NativeValue::Int(31)));
	/// ```
	pub fn with(mut self, name: impl Into<String>, value: impl Into<NativeValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Insert or replace an attribute, returning the previous value
	pub fn insert(
		&mut self,
		name: impl Into<String>,
		value: impl Into<NativeValue>,
	) -> Option<NativeValue> {
		self.attrs.insert(name.into(), value.into())
	}

	pub fn get(&self, name: &str) -> Option<&NativeValue> {
		self.attrs.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut NativeValue> {
		self.attrs.get_mut(name)
	}

	/// Remove an attribute, keeping the order of the remaining ones
	pub fn remove(&mut self, name: &str) -> Option<NativeValue> {
		self.attrs.shift_remove(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.attrs.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.attrs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attrs.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.attrs.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
		self.attrs.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Generic wire rendering of every attribute
	pub fn to_wire(&self) -> WireObject {
		self.attrs
			.iter()
			.map(|(k, v)| (k.clone(), v.to_wire()))
			.collect()
	}

	/// Generic conversion of a wire object
	pub fn from_wire(object: &WireObject) -> Self {
		object
			.iter()
			.map(|(k, v)| (k.clone(), NativeValue::from_wire(v)))
			.collect()
	}
}

impl FromIterator<(String, NativeValue)> for Record {
	fn from_iter<I: IntoIterator<Item = (String, NativeValue)>>(iter: I) -> Self {
		Self {
			attrs: iter.into_iter().collect(),
		}
	}
}

impl IntoIterator for Record {
	type Item = (String, NativeValue);
	type IntoIter = indexmap::map::IntoIter<String, NativeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.attrs.into_iter()
	}
}

/// Build a [`Record`] from `name => value` pairs
///
/// # Examples
///
/// ```
/// use nap_core::record;
///
/// let author = record! { "name" => "Ann", "age" => 31 };
/// assert_eq!(author.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
	($($name:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut record = $crate::value::Record::new();
		$(
			record.insert($name, $value);
		)*
		record
	}};
}
