//! Serializer behaviour across nested composition, typed resources and
//! partial updates

use nap_core::validators::{MaxLength, MinValue, NotBlank};
use nap_core::{
	record, ErrorDetail, Field, FieldKind, NativeValue, Record, Resource, Serializer,
	SerializerError,
};
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use std::sync::Arc;

fn object(value: Value) -> nap_core::WireObject {
	match value {
		Value::Object(map) => map,
		_ => panic!("expected an object literal"),
	}
}

#[fixture]
fn person_serializer() -> Serializer {
	Serializer::builder("PersonSerializer")
		.field(Field::string("name").validator(NotBlank))
		.field(Field::integer("age").validator(MinValue::new(0)))
		.build()
		.unwrap()
}

#[fixture]
fn author_serializer() -> Serializer {
	let address = Arc::new(
		Serializer::builder("AddressSerializer")
			.field(Field::string("city"))
			.field(Field::string("zip").validator(MaxLength(5)))
			.build()
			.unwrap(),
	);
	let tag = Arc::new(
		Serializer::builder("TagSerializer")
			.field(Field::string("label").validator(NotBlank))
			.build()
			.unwrap(),
	);
	Serializer::builder("AuthorSerializer")
		.field(Field::integer("id").read_only())
		.field(Field::string("name"))
		.field(Field::nested("address", address))
		.field(Field::nested_many("tags", tag).optional())
		.field(Field::dig("city", "address.city"))
		.build()
		.unwrap()
}

#[rstest]
fn test_negative_age_reports_only_age(person_serializer: Serializer) {
	// Arrange
	let input = object(json!({"name": "Ann", "age": -1}));

	// Act
	let errors = person_serializer.deserialize(&input, false).unwrap_err();

	// Assert
	assert_eq!(
		Value::Object(errors.to_wire()),
		json!({"age": ["must be >= 0"]})
	);
	assert!(!errors.contains("name"));
}

#[rstest]
fn test_two_invalid_fields_are_reported_together(person_serializer: Serializer) {
	// Arrange
	let input = object(json!({"name": "  ", "age": "old"}));

	// Act
	let errors = person_serializer.deserialize(&input, false).unwrap_err();

	// Assert
	assert_eq!(errors.len(), 2);
	assert_eq!(errors.messages("name").unwrap(), ["may not be blank"]);
	assert_eq!(
		errors.messages("age").unwrap(),
		["Invalid value for field 'age': expected integer, got \"old\"."]
	);
}

#[rstest]
fn test_output_follows_declaration_order(author_serializer: Serializer) {
	// Arrange
	let author = record! {
		"tags" => NativeValue::List(vec![]),
		"address" => record! { "zip" => "10115", "city" => "Berlin" },
		"name" => "Ann",
		"id" => 7,
	};

	// Act
	let wire = author_serializer.serialize(&author).unwrap();

	// Assert
	let keys: Vec<&str> = wire.keys().map(String::as_str).collect();
	assert_eq!(keys, vec!["id", "name", "address", "tags", "city"]);
	let address_keys: Vec<&str> = wire["address"]
		.as_object()
		.unwrap()
		.keys()
		.map(String::as_str)
		.collect();
	assert_eq!(address_keys, vec!["city", "zip"]);
	assert_eq!(wire["city"], json!("Berlin"));
}

#[rstest]
fn test_nested_errors_keep_input_shape(author_serializer: Serializer) {
	// Arrange
	let input = object(json!({
		"name": "Ann",
		"address": {"city": "Berlin", "zip": "1011500"},
		"tags": [{"label": "rust"}, {"label": ""}, "oops"],
	}));

	// Act
	let errors = author_serializer.deserialize(&input, false).unwrap_err();

	// Assert
	assert_eq!(
		Value::Object(errors.to_wire()),
		json!({
			"address": {"zip": ["length must be <= 5"]},
			"tags": {
				"1": {"label": ["may not be blank"]},
				"2": {"_all": ["Expected an object, got string."]},
			},
		})
	);
	assert!(matches!(errors.get("tags"), Some(ErrorDetail::Items(_))));
}

#[rstest]
fn test_nested_object_must_be_a_mapping(author_serializer: Serializer) {
	let input = object(json!({"name": "Ann", "address": "Berlin"}));

	let errors = author_serializer.deserialize(&input, false).unwrap_err();

	assert_eq!(
		errors.messages("address").unwrap(),
		["Expected an object, got string."]
	);
}

#[rstest]
fn test_partial_update_merges_nested_object(author_serializer: Serializer) {
	// Arrange
	let mut author = record! {
		"id" => 7,
		"name" => "Ann",
		"address" => record! { "city" => "Berlin", "zip" => "10115" },
	};
	let input = object(json!({"address": {"zip": "10117"}}));

	// Act
	let data = author_serializer.deserialize_patch(&input, &author).unwrap();
	author_serializer.apply(&mut author, &data).unwrap();

	// Assert
	assert_eq!(author.dig("address.city"), Some(NativeValue::from("Berlin")));
	assert_eq!(author.dig("address.zip"), Some(NativeValue::from("10117")));
	assert_eq!(author.get("name"), Some(&NativeValue::from("Ann")));
	let address = author.get("address").and_then(NativeValue::as_record).unwrap();
	let keys: Vec<&str> = address.keys().collect();
	assert_eq!(keys, vec!["city", "zip"]);
}

#[rstest]
fn test_patch_without_stored_sub_object_needs_complete_nested(author_serializer: Serializer) {
	// Arrange
	let author = record! { "id" => 7, "name" => "Ann", "address" => NativeValue::Null };
	let input = object(json!({"address": {"zip": "10117"}}));

	// Act
	let errors = author_serializer
		.deserialize_patch(&input, &author)
		.unwrap_err();

	// Assert
	assert_eq!(
		Value::Object(errors.to_wire()),
		json!({"address": {"city": ["This field is required."]}})
	);
}

#[rstest]
fn test_patch_validates_merged_nested_object(author_serializer: Serializer) {
	let author = record! {
		"id" => 7,
		"name" => "Ann",
		"address" => record! { "city" => "Berlin", "zip" => "10115" },
	};
	let input = object(json!({"address": {"zip": "1234567"}}));

	let errors = author_serializer
		.deserialize_patch(&input, &author)
		.unwrap_err();

	assert_eq!(
		Value::Object(errors.to_wire()),
		json!({"address": {"zip": ["length must be <= 5"]}})
	);
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_nested_list_items_are_always_complete(
	author_serializer: Serializer,
	#[case] partial: bool,
) {
	let input = object(json!({"tags": [{"label": "rust"}, {}]}));

	let errors = author_serializer.deserialize(&input, partial).unwrap_err();

	assert_eq!(
		errors.item("tags", 1).unwrap().messages("label").unwrap(),
		["This field is required."]
	);
	assert!(errors.item("tags", 0).is_none());
}

#[rstest]
fn test_partial_deserialize_without_stored_object_needs_complete_nested(
	author_serializer: Serializer,
) {
	let input = object(json!({"address": {"zip": "10117"}}));

	let errors = author_serializer.deserialize(&input, true).unwrap_err();

	assert!(errors.nested("address").unwrap().messages("city").is_some());
}

#[rstest]
fn test_partial_never_reports_required(person_serializer: Serializer) {
	let data = person_serializer
		.deserialize(&object(json!({})), true)
		.unwrap();

	assert!(data.is_empty());
}

#[rstest]
fn test_missing_nested_attribute_fails_loudly() {
	// Arrange
	let inner = Arc::new(
		Serializer::builder("Inner")
			.field(Field::string("label"))
			.build()
			.unwrap(),
	);
	let outer = Serializer::builder("Outer")
		.field(Field::nested("inner", inner))
		.build()
		.unwrap();
	let resource = record! { "inner" => Record::new() };

	// Act
	let err = outer.serialize(&resource).unwrap_err();

	// Assert
	assert_eq!(err, SerializerError::attribute_missing("label", "label"));
}

#[rstest]
fn test_nested_field_rejects_scalar_value() {
	let inner = Arc::new(Serializer::builder("Inner").build().unwrap());
	let outer = Serializer::builder("Outer")
		.field(Field::nested("inner", inner))
		.build()
		.unwrap();

	let err = outer.serialize(&record! { "inner" => 3 }).unwrap_err();

	assert!(matches!(err, SerializerError::NotAnObject { .. }));
}

#[derive(Debug, Default, PartialEq)]
struct Book {
	title: String,
	pages: i64,
	tags: Vec<String>,
}

impl Resource for Book {
	fn get_attr(&self, name: &str) -> Option<NativeValue> {
		match name {
			"title" => Some(self.title.clone().into()),
			"pages" => Some(self.pages.into()),
			"tags" => Some(NativeValue::List(
				self.tags.iter().cloned().map(NativeValue::from).collect(),
			)),
			_ => None,
		}
	}

	fn set_attr(&mut self, name: &str, value: NativeValue) -> Result<(), SerializerError> {
		match (name, value) {
			("title", NativeValue::Text(title)) => self.title = title,
			("pages", NativeValue::Int(pages)) => self.pages = pages,
			("tags", NativeValue::List(tags)) => {
				self.tags = tags
					.iter()
					.filter_map(|t| t.as_str().map(str::to_string))
					.collect()
			}
			(other, _) => return Err(SerializerError::not_writable(other, "unsupported value")),
		}
		Ok(())
	}
}

#[rstest]
fn test_typed_resource_round_trip() {
	// Arrange
	let serializer = Serializer::builder("BookSerializer")
		.field(Field::string("title"))
		.field(Field::integer("pages").validator(MinValue::new(1)))
		.field(Field::list("tags", FieldKind::String))
		.build()
		.unwrap();
	let book = Book {
		title: "Dune".to_string(),
		pages: 412,
		tags: vec!["sf".to_string()],
	};

	// Act
	let wire = serializer.serialize(&book).unwrap();
	let data = serializer.deserialize(&wire, false).unwrap();
	let mut copy = Book::default();
	serializer.apply(&mut copy, &data).unwrap();

	// Assert
	assert_eq!(
		Value::Object(wire),
		json!({"title": "Dune", "pages": 412, "tags": ["sf"]})
	);
	assert_eq!(copy, book);
}

#[rstest]
fn test_apply_surfaces_resource_refusal() {
	let serializer = Serializer::builder("BookSerializer")
		.field(Field::float("pages"))
		.build()
		.unwrap();
	let data = serializer
		.deserialize(&object(json!({"pages": 1.5})), false)
		.unwrap();
	let mut book = Book::default();

	let err = serializer.apply(&mut book, &data).unwrap_err();

	assert!(matches!(err, SerializerError::AttributeNotWritable { .. }));
}

#[rstest]
fn test_patch_replaces_plain_object_values() {
	// Arrange
	let serializer = Serializer::builder("DocumentSerializer")
		.field(Field::any("meta"))
		.build()
		.unwrap();
	let mut document = record! { "meta" => record! { "lang" => "en", "draft" => true } };
	let input = object(json!({"meta": {"lang": "de"}}));

	// Act
	let data = serializer.deserialize_patch(&input, &document).unwrap();
	serializer.apply(&mut document, &data).unwrap();

	// Assert
	assert_eq!(document.dig("meta.lang"), Some(NativeValue::from("de")));
	assert_eq!(document.dig("meta.draft"), None);
}
