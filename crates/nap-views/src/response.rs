//! Status-carrying response produced by endpoints

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use nap_core::WireValue;

/// Endpoint outcome before wire encoding
///
/// `body` is `None` for responses without content such as `204 No Content`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Option<WireValue>,
}

impl Response {
	/// Create an empty response with the given status
	///
	/// # Examples
	///
	/// ```
	/// use http::StatusCode;
	/// use nap_views::Response;
	///
	/// let response = Response::new(StatusCode::ACCEPTED);
	/// assert_eq!(response.status, StatusCode::ACCEPTED);
	/// assert!(response.body.is_none());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: None,
		}
	}

	/// `200 OK` with a body
	pub fn ok(body: WireValue) -> Self {
		Self::new(StatusCode::OK).with_body(body)
	}

	/// `201 Created` with a body
	pub fn created(body: WireValue) -> Self {
		Self::new(StatusCode::CREATED).with_body(body)
	}

	/// `204 No Content`
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn with_body(mut self, body: WireValue) -> Self {
		self.body = Some(body);
		self
	}

	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::header::ALLOW;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(Response::ok(json!([])), StatusCode::OK)]
	#[case(Response::created(json!({})), StatusCode::CREATED)]
	#[case(Response::no_content(), StatusCode::NO_CONTENT)]
	fn test_constructors_set_status(#[case] response: Response, #[case] status: StatusCode) {
		assert_eq!(response.status, status);
		assert!(response.is_success());
	}

	#[rstest]
	fn test_with_header() {
		let response = Response::new(StatusCode::METHOD_NOT_ALLOWED)
			.with_header(ALLOW, HeaderValue::from_static("GET, POST"));

		assert_eq!(response.headers.get(ALLOW).unwrap(), "GET, POST");
	}
}
