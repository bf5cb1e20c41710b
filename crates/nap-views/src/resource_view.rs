//! RESTful dispatcher tying a serializer to a store

use crate::exception::{ApiError, ApiResult};
use crate::operation::Operation;
use crate::request::ApiRequest;
use crate::response::Response;
use crate::store::{Filter, Store};
use async_trait::async_trait;
use nap_core::{Serializer, WireValue};
use serde_json::Value;
use std::sync::Arc;

/// Anything that turns an [`ApiRequest`] into a [`Response`]
#[async_trait]
pub trait Endpoint: Send + Sync {
	/// Name used in logs and by routers
	fn name(&self) -> &str;

	async fn dispatch(&self, request: ApiRequest) -> ApiResult<Response>;
}

/// Resource endpoint performing list, detail, create, update, partial
/// update and delete through one serializer and one store
///
/// The view keeps no state between requests besides its declaration.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use nap_core::{Field, Serializer};
/// use nap_views::{ApiRequest, Endpoint, InMemoryStore, ResourceView};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let serializer = Serializer::builder("NoteSerializer")
///     .field(Field::integer("id").read_only())
///     .field(Field::string("text"))
///     .build()
///     .unwrap();
/// let view = ResourceView::new("notes", Arc::new(serializer), Arc::new(InMemoryStore::new()));
///
/// let created = view
///     .dispatch(ApiRequest::post().with_body(json!({"text": "hi"})))
///     .await
///     .unwrap();
/// assert_eq!(created.status, StatusCode::CREATED);
/// assert_eq!(created.body, Some(json!({"id": 1, "text": "hi"})));
/// # });
/// ```
pub struct ResourceView<S: Store> {
	name: String,
	serializer: Arc<Serializer>,
	store: Arc<S>,
	operations: Vec<Operation>,
}

impl<S: Store> ResourceView<S> {
	/// Create a view serving every operation
	pub fn new(name: impl Into<String>, serializer: Arc<Serializer>, store: Arc<S>) -> Self {
		Self {
			name: name.into(),
			serializer,
			store,
			operations: Operation::ALL.to_vec(),
		}
	}

	/// Restrict the view to list and detail
	pub fn read_only(self) -> Self {
		self.only([Operation::List, Operation::Detail])
	}

	/// Restrict the view to the given operations
	pub fn only(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
		self.operations = operations.into_iter().collect();
		self
	}

	pub fn operations(&self) -> &[Operation] {
		&self.operations
	}

	pub fn serializer(&self) -> &Arc<Serializer> {
		&self.serializer
	}

	pub fn store(&self) -> &Arc<S> {
		&self.store
	}

	/// Resolve the operation for a request, honouring the restriction
	pub fn resolve(&self, request: &ApiRequest) -> ApiResult<Operation> {
		Operation::resolve(request.method(), request.has_id())
			.filter(|operation| self.operations.contains(operation))
			.ok_or_else(|| {
				let allowed = Operation::allowed_methods(&self.operations, request.has_id());
				tracing::debug!(
					view = %self.name,
					method = %request.method(),
					has_id = request.has_id(),
					"no operation for request"
				);
				ApiError::MethodNotAllowed {
					method: request.method().clone(),
					allowed,
				}
			})
	}

	pub async fn list(&self, filter: &Filter) -> ApiResult<Response> {
		let objects = self.store.list(filter).await?;
		let items = objects
			.iter()
			.map(|object| self.serializer.serialize(object).map(Value::Object))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Response::ok(Value::Array(items)))
	}

	pub async fn detail(&self, id: &str) -> ApiResult<Response> {
		let object = self.store.get(id).await?;
		Ok(Response::ok(Value::Object(self.serializer.serialize(&object)?)))
	}

	/// Validate `body` and create a new object; invalid input never reaches
	/// the store
	pub async fn create(&self, body: &WireValue) -> ApiResult<Response> {
		let data = self.serializer.deserialize_value(body, false)?;
		let object = self.store.create(&data).await?;
		Ok(Response::created(Value::Object(
			self.serializer.serialize(&object)?,
		)))
	}

	/// Validate `body` and save it onto an existing object
	///
	/// With `partial` set, fields absent from `body` keep their values and
	/// nested objects are merged into the stored ones before validation.
	pub async fn update(&self, id: &str, body: &WireValue, partial: bool) -> ApiResult<Response> {
		let (object, data) = if partial {
			let object = self.store.get(id).await?;
			let data = match body {
				Value::Object(patch) => self.serializer.deserialize_patch(patch, &object)?,
				other => self.serializer.deserialize_value(other, true)?,
			};
			(object, data)
		} else {
			let data = self.serializer.deserialize_value(body, false)?;
			(self.store.get(id).await?, data)
		};
		let saved = self.store.save(object, &data).await?;
		Ok(Response::ok(Value::Object(self.serializer.serialize(&saved)?)))
	}

	pub async fn delete(&self, id: &str) -> ApiResult<Response> {
		self.store.delete(id).await?;
		Ok(Response::no_content())
	}
}

#[async_trait]
impl<S: Store> Endpoint for ResourceView<S> {
	fn name(&self) -> &str {
		&self.name
	}

	async fn dispatch(&self, request: ApiRequest) -> ApiResult<Response> {
		let operation = self.resolve(&request)?;
		tracing::debug!(view = %self.name, %operation, id = ?request.id(), "dispatching");
		let id = request.id().unwrap_or_default();
		match operation {
			Operation::List => self.list(request.filter()).await,
			Operation::Detail => self.detail(id).await,
			Operation::Create => self.create(&request.body_or_empty()).await,
			Operation::Update | Operation::PartialUpdate => {
				self.update(id, &request.body_or_empty(), operation.is_partial())
					.await
			}
			Operation::Delete => self.delete(id).await,
		}
	}
}

impl<S: Store> std::fmt::Debug for ResourceView<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResourceView")
			.field("name", &self.name)
			.field("serializer", &self.serializer.name())
			.field("operations", &self.operations)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::InMemoryStore;
	use http::{Method, StatusCode};
	use nap_core::{record, Field};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn view() -> ResourceView<InMemoryStore> {
		let serializer = Serializer::builder("TaskSerializer")
			.field(Field::integer("id").read_only())
			.field(Field::string("title"))
			.field(Field::boolean("done").with_default(false))
			.build()
			.unwrap();
		ResourceView::new("tasks", Arc::new(serializer), Arc::new(InMemoryStore::new()))
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_applies_field_default(view: ResourceView<InMemoryStore>) {
		let response = view.create(&json!({"title": "Write docs"})).await.unwrap();

		assert_eq!(response.status, StatusCode::CREATED);
		assert_eq!(
			response.body,
			Some(json!({"id": 1, "title": "Write docs", "done": false}))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_invalid_update_leaves_store_untouched(view: ResourceView<InMemoryStore>) {
		// Arrange
		view.store().insert(record! { "title" => "Write docs", "done" => false });

		// Act
		let err = view.update("1", &json!({"done": "perhaps"}), true).await.unwrap_err();

		// Assert
		assert!(matches!(err, ApiError::Validation(_)));
		let detail = view.detail("1").await.unwrap();
		assert_eq!(detail.body.unwrap()["done"], json!(false));
	}

	#[rstest]
	#[tokio::test]
	async fn test_read_only_view_rejects_create(view: ResourceView<InMemoryStore>) {
		let view = view.read_only();

		let err = view
			.dispatch(ApiRequest::post().with_body(json!({"title": "x"})))
			.await
			.unwrap_err();

		match err {
			ApiError::MethodNotAllowed { method, allowed } => {
				assert_eq!(method, Method::POST);
				assert_eq!(allowed, vec![Method::GET]);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_non_object_body_is_validation_error(view: ResourceView<InMemoryStore>) {
		let err = view.create(&json!(["title"])).await.unwrap_err();

		match err {
			ApiError::Validation(errors) => {
				assert_eq!(
					errors.non_field_errors().unwrap(),
					["Expected an object, got list."]
				);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
