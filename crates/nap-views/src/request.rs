//! Transport-independent request envelope handed to endpoints

use crate::store::Filter;
use http::Method;
use nap_core::{WireObject, WireValue};
use serde_json::Value;

/// Verb, resource identifier, query filter, decoded body and RPC action name
///
/// The identifier is supplied by the caller's URL router; the envelope does
/// not parse paths.
///
/// # Examples
///
/// ```
/// use nap_views::ApiRequest;
/// use serde_json::json;
///
/// let request = ApiRequest::patch("7").with_body(json!({"name": "Bea"}));
/// assert_eq!(request.id(), Some("7"));
/// assert!(request.body().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
	method: Method,
	id: Option<String>,
	filter: Filter,
	body: Option<WireValue>,
	action: Option<String>,
}

impl ApiRequest {
	pub fn new(method: Method) -> Self {
		Self {
			method,
			id: None,
			filter: Filter::new(),
			body: None,
			action: None,
		}
	}

	/// `GET` on the collection
	pub fn list() -> Self {
		Self::new(Method::GET)
	}

	/// `GET` on one resource
	pub fn detail(id: impl Into<String>) -> Self {
		Self::new(Method::GET).with_id(id)
	}

	pub fn post() -> Self {
		Self::new(Method::POST)
	}

	pub fn put(id: impl Into<String>) -> Self {
		Self::new(Method::PUT).with_id(id)
	}

	pub fn patch(id: impl Into<String>) -> Self {
		Self::new(Method::PATCH).with_id(id)
	}

	pub fn delete(id: impl Into<String>) -> Self {
		Self::new(Method::DELETE).with_id(id)
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_body(mut self, body: WireValue) -> Self {
		self.body = Some(body);
		self
	}

	pub fn with_filter(mut self, filter: Filter) -> Self {
		self.filter = filter;
		self
	}

	/// Add one query condition
	pub fn with_query(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
		self.filter = self.filter.with(attribute, value);
		self
	}

	/// Name of the RPC action to invoke
	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	pub fn has_id(&self) -> bool {
		self.id.is_some()
	}

	pub fn filter(&self) -> &Filter {
		&self.filter
	}

	pub fn body(&self) -> Option<&WireValue> {
		self.body.as_ref()
	}

	pub fn action(&self) -> Option<&str> {
		self.action.as_deref()
	}

	/// Decoded body, or an empty object when none was sent
	pub fn body_or_empty(&self) -> WireValue {
		self.body
			.clone()
			.unwrap_or_else(|| Value::Object(WireObject::new()))
	}
}
