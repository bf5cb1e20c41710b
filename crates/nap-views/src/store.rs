//! Persistence contract consumed by resource views
//!
//! Views never touch storage directly: every read and write goes through a
//! [`Store`]. [`InMemoryStore`] is a process-local implementation backed by
//! [`Record`]s, used for tests and small services.

use async_trait::async_trait;
use indexmap::IndexMap;
use nap_core::{NativeValue, Record, Resource, SerializerError, ValidatedData};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// Errors reported by a [`Store`]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
	/// No object exists under the identifier
	#[error("Object with id '{0}' not found")]
	NotFound(String),

	/// The storage backend failed; the message is for server-side logs only
	#[error("Store backend error: {0}")]
	Backend(String),
}

impl From<SerializerError> for StoreError {
	fn from(err: SerializerError) -> Self {
		StoreError::Backend(err.to_string())
	}
}

/// Attribute equality filter built from query parameters
///
/// Values are compared against each object's attribute in string form, so
/// `?age=31` matches an integer attribute `31`. All pairs must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
	conditions: IndexMap<String, String>,
}

impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an `attribute == value` condition
	pub fn with(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
		self.conditions.insert(attribute.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn conditions(&self) -> impl Iterator<Item = (&str, &str)> {
		self.conditions.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Check a resource against every condition
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::record;
	/// use nap_views::Filter;
	///
	/// let filter = Filter::new().with("age", "31");
	/// assert!(filter.matches(&record! { "age" => 31 }));
	/// assert!(!filter.matches(&record! { "age" => 30 }));
	/// ```
	pub fn matches(&self, resource: &dyn Resource) -> bool {
		self.conditions.iter().all(|(attribute, expected)| {
			resource
				.get_attr(attribute)
				.is_some_and(|value| value.to_query_string() == *expected)
		})
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Filter {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			conditions: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}

/// Load/save/delete capability over one kind of resource
///
/// Implementations are responsible for their own concurrency guarantees;
/// views treat each call as atomic and never retry.
#[async_trait]
pub trait Store: Send + Sync {
	type Object: Resource + Send + Sync;

	async fn list(&self, filter: &Filter) -> Result<Vec<Self::Object>, StoreError>;

	/// Fetch one object, [`StoreError::NotFound`] if absent
	async fn get(&self, id: &str) -> Result<Self::Object, StoreError>;

	/// Construct and persist a new object from validated values
	async fn create(&self, data: &ValidatedData) -> Result<Self::Object, StoreError>;

	/// Apply validated values onto `object` and persist it
	async fn save(&self, object: Self::Object, data: &ValidatedData)
	-> Result<Self::Object, StoreError>;

	/// Remove one object, [`StoreError::NotFound`] if absent
	async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Thread-safe [`Store`] keeping [`Record`]s in memory
///
/// Objects receive increasing integer primary keys on create, stored under
/// the configured key attribute (`id` by default).
///
/// # Examples
///
/// ```
/// use nap_core::{record, NativeValue};
/// use nap_views::{Filter, InMemoryStore, Store};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// store.insert(record! { "name" => "Ann" });
///
/// let people = store.list(&Filter::new()).await.unwrap();
/// assert_eq!(people[0].get("id"), Some(&NativeValue::Int(1)));
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
	key: String,
	objects: RwLock<IndexMap<String, Record>>,
	next_id: AtomicI64,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::with_key("id")
	}

	/// Use a different primary key attribute
	pub fn with_key(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			objects: RwLock::new(IndexMap::new()),
			next_id: AtomicI64::new(1),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	/// Store a record directly, assigning a primary key
	///
	/// Returns the stored record including its key.
	pub fn insert(&self, mut record: Record) -> Record {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		record.insert(self.key.clone(), NativeValue::Int(id));
		self.objects.write().insert(id.to_string(), record.clone());
		record
	}

	pub fn len(&self) -> usize {
		self.objects.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.read().is_empty()
	}
}

impl Default for InMemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Store for InMemoryStore {
	type Object = Record;

	async fn list(&self, filter: &Filter) -> Result<Vec<Record>, StoreError> {
		Ok(self
			.objects
			.read()
			.values()
			.filter(|record| filter.matches(*record))
			.cloned()
			.collect())
	}

	async fn get(&self, id: &str) -> Result<Record, StoreError> {
		self.objects
			.read()
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}

	async fn create(&self, data: &ValidatedData) -> Result<Record, StoreError> {
		Ok(self.insert(data.to_record()))
	}

	async fn save(&self, mut object: Record, data: &ValidatedData) -> Result<Record, StoreError> {
		let key = object.get(&self.key).cloned().ok_or_else(|| {
			StoreError::Backend(format!("record has no '{}' attribute", self.key))
		})?;
		let id = key.to_query_string();
		data.apply_to(&mut object)?;
		// The key attribute is not writable through validated data
		object.insert(self.key.clone(), key);
		let mut objects = self.objects.write();
		match objects.get_mut(&id) {
			Some(stored) => {
				*stored = object.clone();
				Ok(object)
			}
			None => Err(StoreError::NotFound(id)),
		}
	}

	async fn delete(&self, id: &str) -> Result<(), StoreError> {
		self.objects
			.write()
			.shift_remove(id)
			.map(|_| ())
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nap_core::record;
	use rstest::rstest;

	fn data(partial: bool, pairs: &[(&str, NativeValue)]) -> ValidatedData {
		let mut data = ValidatedData::new(partial);
		for (attribute, value) in pairs {
			data.insert(*attribute, value.clone());
		}
		data
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_assigns_increasing_ids() {
		let store = InMemoryStore::new();

		let first = store.create(&data(false, &[("name", "Ann".into())])).await.unwrap();
		let second = store.create(&data(false, &[("name", "Bea".into())])).await.unwrap();

		assert_eq!(first.get("id"), Some(&NativeValue::Int(1)));
		assert_eq!(second.get("id"), Some(&NativeValue::Int(2)));
		assert_eq!(store.len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_missing_is_not_found() {
		let store = InMemoryStore::new();

		let err = store.get("42").await.unwrap_err();

		assert_eq!(err, StoreError::NotFound("42".to_string()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_keeps_primary_key() {
		// Arrange
		let store = InMemoryStore::new();
		let stored = store.insert(record! { "name" => "Ann" });
		let patch = data(true, &[("name", "Bea".into()), ("id", NativeValue::Int(99))]);

		// Act
		let saved = store.save(stored, &patch).await.unwrap();

		// Assert
		assert_eq!(saved.get("id"), Some(&NativeValue::Int(1)));
		assert_eq!(
			store.get("1").await.unwrap().get("name"),
			Some(&NativeValue::from("Bea"))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_save_after_delete_is_not_found() {
		let store = InMemoryStore::new();
		let stored = store.insert(record! { "name" => "Ann" });
		store.delete("1").await.unwrap();

		let err = store.save(stored, &data(true, &[])).await.unwrap_err();

		assert_eq!(err, StoreError::NotFound("1".to_string()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_list_applies_filter() {
		let store = InMemoryStore::new();
		store.insert(record! { "name" => "Ann", "active" => true });
		store.insert(record! { "name" => "Bea", "active" => false });

		let active = store.list(&Filter::new().with("active", "true")).await.unwrap();

		assert_eq!(active.len(), 1);
		assert_eq!(active[0].get("name"), Some(&NativeValue::from("Ann")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_twice_is_not_found() {
		let store = InMemoryStore::new();
		store.insert(record! { "name" => "Ann" });

		store.delete("1").await.unwrap();
		let err = store.delete("1").await.unwrap_err();

		assert!(matches!(err, StoreError::NotFound(_)));
	}
}
