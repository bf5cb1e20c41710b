//! Named RPC actions and the endpoint dispatching them
//!
//! An action is a handler bound to a name. Its input and output serializers
//! are independently optional: without an input serializer the handler sees
//! the raw body, without an output serializer its result is converted to the
//! wire form as-is.

use crate::exception::{ApiError, ApiResult};
use crate::request::ApiRequest;
use crate::resource_view::Endpoint;
use crate::response::Response;
use async_trait::async_trait;
use http::Method;
use indexmap::IndexMap;
use nap_core::{DeclarationError, NativeValue, Serializer, ValidatedData, WireObject, WireValue};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Header carrying the action name for [`RpcView`] (`X-RPC-Action`)
pub const DEFAULT_ACTION_HEADER: &str = "x-rpc-action";

/// Input handed to an action handler
#[derive(Debug, Clone, PartialEq)]
pub enum ActionInput {
	/// No body was sent and the action declares no input serializer
	None,
	/// Body passed through untouched
	Raw(WireValue),
	/// Body validated by the action's input serializer
	Data(ValidatedData),
}

impl ActionInput {
	pub fn is_none(&self) -> bool {
		matches!(self, ActionInput::None)
	}

	/// Validated data, if the action declares an input serializer
	pub fn data(&self) -> Option<&ValidatedData> {
		match self {
			ActionInput::Data(data) => Some(data),
			_ => None,
		}
	}

	pub fn raw(&self) -> Option<&WireValue> {
		match self {
			ActionInput::Raw(body) => Some(body),
			_ => None,
		}
	}

	/// Look up one input value regardless of the input kind
	pub fn get(&self, name: &str) -> Option<NativeValue> {
		match self {
			ActionInput::None => None,
			ActionInput::Raw(body) => body.get(name).map(NativeValue::from_wire),
			ActionInput::Data(data) => data.get(name).cloned(),
		}
	}
}

/// Handler invoked for a named action
#[async_trait]
pub trait ActionHandler: Send + Sync {
	/// Run the action; `None` means the action emits no body
	async fn handle(&self, input: ActionInput) -> ApiResult<Option<NativeValue>>;
}

/// Boxed future returned by closures wrapped in [`FunctionActionHandler`]
pub type ActionFuture = Pin<Box<dyn Future<Output = ApiResult<Option<NativeValue>>> + Send>>;

type HandlerFn = dyn Fn(ActionInput) -> ActionFuture + Send + Sync;

/// Adapts a closure returning a boxed future into an [`ActionHandler`]
///
/// # Examples
///
/// ```
/// use nap_core::{record, NativeValue};
/// use nap_views::FunctionActionHandler;
///
/// let handler = FunctionActionHandler::new(|_input| {
///     Box::pin(async { Ok(Some(NativeValue::from(record! { "pong" => true }))) })
/// });
/// ```
pub struct FunctionActionHandler {
	handler: Box<HandlerFn>,
}

impl FunctionActionHandler {
	pub fn new<F>(handler: F) -> Self
	where
		F: Fn(ActionInput) -> ActionFuture + Send + Sync + 'static,
	{
		Self {
			handler: Box::new(handler),
		}
	}
}

#[async_trait]
impl ActionHandler for FunctionActionHandler {
	async fn handle(&self, input: ActionInput) -> ApiResult<Option<NativeValue>> {
		(self.handler)(input).await
	}
}

/// A handler bound to a name, with optional input and output serializers
#[derive(Clone)]
pub struct RpcAction {
	name: String,
	handler: Arc<dyn ActionHandler>,
	input: Option<Arc<Serializer>>,
	output: Option<Arc<Serializer>>,
}

impl RpcAction {
	pub fn new(name: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
		Self {
			name: name.into(),
			handler: Arc::new(handler),
			input: None,
			output: None,
		}
	}

	/// Validate the body with `serializer` before calling the handler
	pub fn with_input(mut self, serializer: Arc<Serializer>) -> Self {
		self.input = Some(serializer);
		self
	}

	/// Serialize the handler result with `serializer`
	pub fn with_output(mut self, serializer: Arc<Serializer>) -> Self {
		self.output = Some(serializer);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	fn prepare_input(&self, body: Option<&WireValue>) -> ApiResult<ActionInput> {
		match (&self.input, body) {
			(Some(serializer), Some(body)) => Ok(ActionInput::Data(
				serializer.deserialize_value(body, false)?,
			)),
			(Some(serializer), None) => Ok(ActionInput::Data(
				serializer.deserialize(&WireObject::new(), false)?,
			)),
			(None, None) | (None, Some(Value::Null)) => Ok(ActionInput::None),
			(None, Some(body)) => Ok(ActionInput::Raw(body.clone())),
		}
	}

	fn render_output(&self, result: Option<NativeValue>) -> ApiResult<Option<WireValue>> {
		let Some(value) = result else {
			return Ok(None);
		};
		let wire = match (&self.output, &value) {
			(Some(serializer), NativeValue::Object(record)) => {
				Value::Object(serializer.serialize(record)?)
			}
			(Some(serializer), NativeValue::List(items)) => Value::Array(
				items
					.iter()
					.map(|item| match item {
						NativeValue::Object(record) => serializer.serialize(record).map(Value::Object),
						other => Err(not_an_object(serializer, other)),
					})
					.collect::<Result<Vec<_>, _>>()?,
			),
			(Some(serializer), other) => return Err(not_an_object(serializer, other).into()),
			(None, value) => value.to_wire(),
		};
		Ok(Some(wire))
	}

	/// Prepare the input, run the handler and render its result
	pub async fn invoke(&self, body: Option<&WireValue>) -> ApiResult<Option<WireValue>> {
		let input = self.prepare_input(body)?;
		let result = self.handler.handle(input).await?;
		self.render_output(result)
	}
}

impl std::fmt::Debug for RpcAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RpcAction")
			.field("name", &self.name)
			.field("input", &self.input.as_ref().map(|s| s.name().to_string()))
			.field("output", &self.output.as_ref().map(|s| s.name().to_string()))
			.finish()
	}
}

fn not_an_object(serializer: &Serializer, found: &NativeValue) -> nap_core::SerializerError {
	nap_core::SerializerError::NotAnObject {
		serializer: serializer.name().to_string(),
		found: found.type_name().to_string(),
	}
}

/// Flat mapping from action name to [`RpcAction`]
///
/// Built once at startup and shared read-only.
///
/// # Examples
///
/// ```
/// use nap_core::{record, NativeValue};
/// use nap_views::{ActionRegistry, FunctionActionHandler, RpcAction};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut registry = ActionRegistry::new();
/// registry
///     .register(RpcAction::new(
///         "ping",
///         FunctionActionHandler::new(|_| {
///             Box::pin(async { Ok(Some(NativeValue::from(record! { "pong" => true }))) })
///         }),
///     ))
///     .unwrap();
///
/// let result = registry.dispatch("ping", None).await.unwrap();
/// assert_eq!(result, Some(json!({"pong": true})));
/// assert!(registry.dispatch("pong", None).await.is_err());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
	actions: IndexMap<String, RpcAction>,
}

impl ActionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an action; names must be unique
	pub fn register(&mut self, action: RpcAction) -> Result<(), DeclarationError> {
		if self.actions.contains_key(action.name()) {
			return Err(DeclarationError::DuplicateAction(action.name().to_string()));
		}
		self.actions.insert(action.name().to_string(), action);
		Ok(())
	}

	/// Builder form of [`register`](Self::register)
	pub fn with_action(mut self, action: RpcAction) -> Result<Self, DeclarationError> {
		self.register(action)?;
		Ok(self)
	}

	pub fn get(&self, name: &str) -> Option<&RpcAction> {
		self.actions.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.actions.contains_key(name)
	}

	/// Registered names in registration order
	pub fn action_names(&self) -> Vec<&str> {
		self.actions.keys().map(String::as_str).collect()
	}

	pub fn len(&self) -> usize {
		self.actions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	/// Run the action registered under `name`
	pub async fn dispatch(
		&self,
		name: &str,
		body: Option<&WireValue>,
	) -> ApiResult<Option<WireValue>> {
		let Some(action) = self.actions.get(name) else {
			tracing::warn!(action = name, "unknown RPC action");
			return Err(ApiError::ActionNotFound(name.to_string()));
		};
		tracing::debug!(action = name, "dispatching RPC action");
		action.invoke(body).await
	}
}

/// Endpoint exposing an [`ActionRegistry`] over HTTP
///
/// `POST` runs the action named by the request's action (taken from the
/// action header by the adapter); `GET` lists the registered names; any
/// other verb is not allowed.
#[derive(Debug, Clone)]
pub struct RpcView {
	name: String,
	registry: Arc<ActionRegistry>,
}

impl RpcView {
	pub fn new(name: impl Into<String>, registry: Arc<ActionRegistry>) -> Self {
		Self {
			name: name.into(),
			registry,
		}
	}

	pub fn registry(&self) -> &ActionRegistry {
		&self.registry
	}
}

#[async_trait]
impl Endpoint for RpcView {
	fn name(&self) -> &str {
		&self.name
	}

	async fn dispatch(&self, request: ApiRequest) -> ApiResult<Response> {
		match *request.method() {
			Method::GET => {
				let names = self
					.registry
					.action_names()
					.into_iter()
					.map(|name| Value::String(name.to_string()))
					.collect();
				Ok(Response::ok(Value::Array(names)))
			}
			Method::POST => {
				let name = request.action().ok_or_else(|| {
					ApiError::BadRequest("No RPC action specified.".to_string())
				})?;
				match self.registry.dispatch(name, request.body()).await? {
					Some(body) => Ok(Response::ok(body)),
					None => Ok(Response::no_content()),
				}
			}
			_ => Err(ApiError::MethodNotAllowed {
				method: request.method().clone(),
				allowed: vec![Method::GET, Method::POST],
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nap_core::validators::MinValue;
	use nap_core::{record, Field};
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn echo() -> FunctionActionHandler {
		FunctionActionHandler::new(|input| {
			Box::pin(async move {
				let sum = input.get("a").and_then(|v| v.as_i64()).unwrap_or_default()
					+ input.get("b").and_then(|v| v.as_i64()).unwrap_or_default();
				Ok(Some(NativeValue::from(record! { "sum" => sum })))
			})
		})
	}

	#[fixture]
	fn registry() -> ActionRegistry {
		let input = Arc::new(
			Serializer::builder("AddInput")
				.field(Field::integer("a").validator(MinValue::new(0)))
				.field(Field::integer("b"))
				.build()
				.unwrap(),
		);
		ActionRegistry::new()
			.with_action(RpcAction::new("add", echo()).with_input(input))
			.unwrap()
			.with_action(RpcAction::new("add_raw", echo()))
			.unwrap()
			.with_action(RpcAction::new(
				"noop",
				FunctionActionHandler::new(|_| Box::pin(async { Ok(None) })),
			))
			.unwrap()
	}

	#[rstest]
	fn test_duplicate_action_is_rejected(registry: ActionRegistry) {
		let mut registry = registry;

		let err = registry.register(RpcAction::new("add", echo())).unwrap_err();

		assert_eq!(err, DeclarationError::DuplicateAction("add".to_string()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_input_serializer_coerces_body(registry: ActionRegistry) {
		let body = json!({"a": "2", "b": 3});

		let result = registry.dispatch("add", Some(&body)).await.unwrap();

		assert_eq!(result, Some(json!({"sum": 5})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_input_serializer_reports_validation(registry: ActionRegistry) {
		let body = json!({"a": -1});

		let err = registry.dispatch("add", Some(&body)).await.unwrap_err();

		match err {
			ApiError::Validation(errors) => {
				assert_eq!(errors.messages("a").unwrap(), ["must be >= 0"]);
				assert_eq!(errors.messages("b").unwrap(), ["This field is required."]);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_raw_input_without_serializer(registry: ActionRegistry) {
		let body = json!({"a": 4, "b": 1});

		let result = registry.dispatch("add_raw", Some(&body)).await.unwrap();

		assert_eq!(result, Some(json!({"sum": 5})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_raw_input_accepts_any_body(registry: ActionRegistry) {
		let result = registry
			.dispatch("add_raw", Some(&json!([1, 2])))
			.await
			.unwrap();

		assert_eq!(result, Some(json!({"sum": 0})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_action_without_result(registry: ActionRegistry) {
		let result = registry.dispatch("noop", None).await.unwrap();

		assert_eq!(result, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_output_serializer_shapes_result() {
		// Arrange
		let output = Arc::new(
			Serializer::builder("UserOutput")
				.field(Field::string("name"))
				.build()
				.unwrap(),
		);
		let registry = ActionRegistry::new()
			.with_action(
				RpcAction::new(
					"whoami",
					FunctionActionHandler::new(|_| {
						Box::pin(async {
							Ok(Some(NativeValue::from(
								record! { "name" => "Ann", "password" => "secret" },
							)))
						})
					}),
				)
				.with_output(output),
			)
			.unwrap();

		// Act
		let result = registry.dispatch("whoami", None).await.unwrap();

		// Assert
		assert_eq!(result, Some(json!({"name": "Ann"})));
	}

	#[rstest]
	#[tokio::test]
	async fn test_rpc_view_lists_actions(registry: ActionRegistry) {
		let view = RpcView::new("rpc", Arc::new(registry));

		let response = view.dispatch(ApiRequest::list()).await.unwrap();

		assert_eq!(response.body, Some(json!(["add", "add_raw", "noop"])));
	}

	#[rstest]
	#[tokio::test]
	async fn test_rpc_view_without_action_name(registry: ActionRegistry) {
		let view = RpcView::new("rpc", Arc::new(registry));

		let err = view.dispatch(ApiRequest::post()).await.unwrap_err();

		assert!(matches!(err, ApiError::BadRequest(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_rpc_view_rejects_delete(registry: ActionRegistry) {
		let view = RpcView::new("rpc", Arc::new(registry));

		let err = view
			.dispatch(ApiRequest::new(Method::DELETE))
			.await
			.unwrap_err();

		assert_eq!(err.status(), http::StatusCode::METHOD_NOT_ALLOWED);
	}
}
