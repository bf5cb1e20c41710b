//! Attribute access capability for resource objects
//!
//! Serializers never inspect a resource's concrete type. Anything that can
//! read and write named attributes as [`NativeValue`]s can be serialized.

use crate::error::SerializerError;
use crate::value::{NativeValue, Record};

/// Get/set-by-name contract implemented by every serializable object
///
/// # Examples
///
/// ```
/// use nap_core::{NativeValue, Resource, SerializerError};
///
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl Resource for Person {
///     fn get_attr(&self, name: &str) -> Option<NativeValue> {
///         match name {
///             "name" => Some(self.name.clone().into()),
///             "age" => Some(self.age.into()),
///             _ => None,
///         }
///     }
///
///     fn set_attr(&mut self, name: &str, value: NativeValue) -> Result<(), SerializerError> {
///         match (name, value) {
///             ("name", NativeValue::Text(v)) => self.name = v,
///             ("age", NativeValue::Int(v)) => self.age = v,
///             (other, _) => return Err(SerializerError::not_writable(other, "unsupported")),
///         }
///         Ok(())
///     }
/// }
///
/// let person = Person { name: "Ann".to_string(), age: 31 };
/// assert_eq!(person.get_attr("age"), Some(NativeValue::Int(31)));
/// ```
pub trait Resource {
	/// Read an attribute, `None` if the resource has no such attribute
	fn get_attr(&self, name: &str) -> Option<NativeValue>;

	/// Write an attribute
	fn set_attr(&mut self, name: &str, value: NativeValue) -> Result<(), SerializerError>;

	/// Resolve a dotted path such as `author.address.city`
	///
	/// The first segment is read from this resource; later segments descend
	/// through nested [`NativeValue::Object`] values. Any missing segment
	/// yields `None`.
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::{record, NativeValue, Resource};
	///
	/// let post = record! { "author" => record! { "name" => "Ann" } };
	/// assert_eq!(post.dig("author.name"), Some(NativeValue::from("Ann")));
	/// assert_eq!(post.dig("author.email"), None);
	/// ```
	fn dig(&self, path: &str) -> Option<NativeValue> {
		let mut segments = path.split('.');
		let first = segments.next()?;
		let mut current = self.get_attr(first)?;
		for segment in segments {
			current = match current {
				NativeValue::Object(record) => record.get(segment)?.clone(),
				_ => return None,
			};
		}
		Some(current)
	}
}

impl Resource for Record {
	fn get_attr(&self, name: &str) -> Option<NativeValue> {
		self.get(name).cloned()
	}

	fn set_attr(&mut self, name: &str, value: NativeValue) -> Result<(), SerializerError> {
		self.insert(name, value);
		Ok(())
	}
}

impl<R: Resource + ?Sized> Resource for Box<R> {
	fn get_attr(&self, name: &str) -> Option<NativeValue> {
		(**self).get_attr(name)
	}

	fn set_attr(&mut self, name: &str, value: NativeValue) -> Result<(), SerializerError> {
		(**self).set_attr(name, value)
	}
}
