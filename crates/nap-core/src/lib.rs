//! # nap-core
//!
//! Declarative fields and serializers converting resources to and from wire
//! objects.
//!
//! ## Overview
//!
//! - [`Field`] describes one attribute: where it is read from, how it is
//!   coerced and which validators apply.
//! - [`Serializer`] is an ordered collection of fields. `serialize` produces
//!   a [`WireObject`] in declaration order; `deserialize` returns either
//!   [`ValidatedData`] or a [`ValidationErrors`] mapping covering every
//!   failing field.
//! - [`Resource`] is the attribute access capability serializers rely on.
//!   [`Record`] is the generic implementation.
//!
//! ## Quick Start
//!
//! ```
//! use nap_core::validators::MinValue;
//! use nap_core::{record, Field, Serializer};
//! use serde_json::json;
//!
//! let serializer = Serializer::builder("PersonSerializer")
//!     .field(Field::integer("id").read_only())
//!     .field(Field::string("name"))
//!     .field(Field::integer("age").validator(MinValue::new(0)))
//!     .build()
//!     .unwrap();
//!
//! let mut person = record! { "id" => 1, "name" => "Ann", "age" => 31 };
//! let wire = serializer.serialize(&person).unwrap();
//! assert_eq!(wire["name"], json!("Ann"));
//!
//! let patch = json!({"age": 32});
//! let data = serializer.deserialize(patch.as_object().unwrap(), true).unwrap();
//! serializer.apply(&mut person, &data).unwrap();
//! assert_eq!(person.get("age").and_then(|v| v.as_i64()), Some(32));
//! ```

pub mod error;
pub mod fields;
pub mod resource;
pub mod serializer;
pub mod validation;
pub mod validators;
pub mod value;

pub use error::{CoercionError, DeclarationError, SerializerError};
pub use fields::{Field, FieldKind, Transform};
pub use resource::Resource;
pub use serializer::{ObjectValidator, Serializer, SerializerBuilder};
pub use validation::{ErrorDetail, NON_FIELD_ERRORS_KEY, ValidatedData, ValidationErrors};
pub use validators::Validator;
pub use value::{NativeValue, Record, WireObject, WireValue};
