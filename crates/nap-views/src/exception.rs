//! Error outcomes of endpoint dispatch and their HTTP mapping

use crate::response::Response;
use crate::store::StoreError;
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use nap_core::{SerializerError, ValidationErrors};
use serde_json::{json, Value};
use thiserror::Error;

/// Result type used across nap views
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single dispatch call
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ApiError {
	/// One or more fields failed coercion or validation
	#[error(transparent)]
	Validation(#[from] ValidationErrors),

	#[error("Object with id '{0}' not found")]
	NotFound(String),

	/// Verb and identifier combination not served by the endpoint
	#[error("Method '{method}' not allowed")]
	MethodNotAllowed { method: Method, allowed: Vec<Method> },

	#[error("Action '{0}' not found")]
	ActionNotFound(String),

	/// Malformed request envelope, such as an undecodable body
	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Request body exceeds {limit} bytes")]
	PayloadTooLarge { limit: usize },

	/// Serializer misconfiguration surfaced at call time
	#[error(transparent)]
	Serializer(#[from] SerializerError),

	/// Storage backend failure
	#[error(transparent)]
	Store(StoreError),
}

impl From<StoreError> for ApiError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::NotFound(id) => ApiError::NotFound(id),
			other => ApiError::Store(other),
		}
	}
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) | ApiError::ActionNotFound(_) => StatusCode::NOT_FOUND,
			ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
			ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
			ApiError::Serializer(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Whether the error is a server-side fault rather than a client mistake
	pub fn is_server_error(&self) -> bool {
		self.status().is_server_error()
	}

	/// Render the error as a response
	///
	/// Validation failures carry the field error mapping as body; everything
	/// else uses `{"detail": ...}`. Server-side faults are logged and only
	/// reveal their cause when `debug` is set.
	///
	/// # Examples
	///
	/// ```
	/// use http::{Method, StatusCode};
	/// use nap_views::ApiError;
	///
	/// let err = ApiError::MethodNotAllowed {
	///     method: Method::PUT,
	///     allowed: vec![Method::GET, Method::POST],
	/// };
	/// let response = err.into_response(false);
	///
	/// assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	/// assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
	/// ```
	pub fn into_response(self, debug: bool) -> Response {
		let status = self.status();
		if self.is_server_error() {
			tracing::error!(error = %self, "request failed with a server error");
		}
		let body = match &self {
			ApiError::Validation(errors) => Value::Object(errors.to_wire()),
			ApiError::NotFound(_) => detail("Not found."),
			ApiError::MethodNotAllowed { method, .. } => {
				detail(&format!("Method \"{}\" not allowed.", method))
			}
			ApiError::ActionNotFound(name) => detail(&format!("Unknown action '{}'.", name)),
			ApiError::BadRequest(message) => detail(message),
			ApiError::PayloadTooLarge { limit } => {
				detail(&format!("Request body exceeds {} bytes.", limit))
			}
			ApiError::Serializer(_) | ApiError::Store(_) if debug => detail(&self.to_string()),
			ApiError::Serializer(_) | ApiError::Store(_) => detail("Internal server error."),
		};
		let mut response = Response::new(status).with_body(body);
		if let ApiError::MethodNotAllowed { allowed, .. } = &self {
			let joined = allowed
				.iter()
				.map(Method::as_str)
				.collect::<Vec<_>>()
				.join(", ");
			if let Ok(value) = HeaderValue::from_str(&joined) {
				response = response.with_header(ALLOW, value);
			}
		}
		response
	}
}

fn detail(message: &str) -> Value {
	json!({ "detail": message })
}
