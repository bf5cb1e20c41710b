//! Conversion between `http` types and the nap request/response envelope

use crate::actions::DEFAULT_ACTION_HEADER;
use crate::codec::{CodecError, JsonCodec};
use crate::exception::{ApiError, ApiResult};
use crate::request::ApiRequest;
use crate::resource_view::Endpoint;
use crate::response::Response;
use crate::store::Filter;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, InvalidHeaderName, CONTENT_TYPE};
use http::StatusCode;

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Bridges `http::Request<Bytes>` and `http::Response<Bytes>` to endpoints
///
/// The adapter does not route: the caller's URL router supplies the
/// resource identifier extracted from the path.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use nap_core::{record, NativeValue};
/// use nap_views::{ActionRegistry, FunctionActionHandler, HttpAdapter, RpcAction, RpcView};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let registry = ActionRegistry::new()
///     .with_action(RpcAction::new(
///         "ping",
///         FunctionActionHandler::new(|_| {
///             Box::pin(async { Ok(Some(NativeValue::from(record! { "pong" => true }))) })
///         }),
///     ))
///     .unwrap();
/// let view = RpcView::new("rpc", Arc::new(registry));
/// let request = Request::post("/rpc/")
///     .header("X-RPC-Action", "ping")
///     .body(Bytes::new())
///     .unwrap();
///
/// let response = HttpAdapter::new().handle(&view, request, None).await;
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(&response.body()[..], br#"{"pong":true}"#);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct HttpAdapter {
	codec: JsonCodec,
	max_body_size: usize,
	action_header: HeaderName,
	debug: bool,
}

impl HttpAdapter {
	pub fn new() -> Self {
		Self {
			codec: JsonCodec::new(),
			max_body_size: DEFAULT_MAX_BODY_SIZE,
			action_header: HeaderName::from_static(DEFAULT_ACTION_HEADER),
			debug: false,
		}
	}

	pub fn with_codec(mut self, codec: JsonCodec) -> Self {
		self.codec = codec;
		self
	}

	/// Reject bodies larger than `limit` bytes
	pub fn with_max_body_size(mut self, limit: usize) -> Self {
		self.max_body_size = limit;
		self
	}

	/// Read RPC action names from a different header
	pub fn with_action_header(mut self, name: &str) -> Result<Self, InvalidHeaderName> {
		self.action_header = HeaderName::try_from(name)?;
		Ok(self)
	}

	/// Expose internal error details in responses
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn action_header(&self) -> &HeaderName {
		&self.action_header
	}

	pub fn max_body_size(&self) -> usize {
		self.max_body_size
	}

	/// Build the envelope for one request
	pub fn to_api_request(
		&self,
		request: &http::Request<Bytes>,
		id: Option<&str>,
	) -> ApiResult<ApiRequest> {
		let body = request.body();
		if body.len() > self.max_body_size {
			return Err(ApiError::PayloadTooLarge {
				limit: self.max_body_size,
			});
		}

		let filter: Filter = match request.uri().query() {
			Some(query) => serde_urlencoded::from_str::<Vec<(String, String)>>(query)
				.map_err(|err| ApiError::BadRequest(format!("Malformed query string: {}", err)))?
				.into_iter()
				.collect(),
			None => Filter::new(),
		};

		let mut api_request = ApiRequest::new(request.method().clone()).with_filter(filter);
		if let Some(id) = id {
			api_request = api_request.with_id(id);
		}
		if let Some(body) = self.codec.decode(body).map_err(codec_error)? {
			api_request = api_request.with_body(body);
		}
		if let Some(action) = request
			.headers()
			.get(&self.action_header)
			.and_then(|value| value.to_str().ok())
		{
			api_request = api_request.with_action(action.trim());
		}
		Ok(api_request)
	}

	/// Encode a dispatch outcome as an HTTP response
	pub fn to_http_response(&self, result: ApiResult<Response>) -> http::Response<Bytes> {
		let response = result.unwrap_or_else(|err| err.into_response(self.debug));
		let body = match &response.body {
			Some(value) => match self.codec.encode(value) {
				Ok(bytes) => Some(bytes),
				Err(err) => {
					tracing::error!(error = %err, "failed to encode response body");
					let mut failed = http::Response::new(Bytes::new());
					*failed.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
					return failed;
				}
			},
			None => None,
		};

		let mut http_response = http::Response::new(body.clone().unwrap_or_default());
		*http_response.status_mut() = response.status;
		*http_response.headers_mut() = response.headers;
		if body.is_some() {
			http_response.headers_mut().insert(
				CONTENT_TYPE,
				HeaderValue::from_static(self.codec.content_type()),
			);
		}
		http_response
	}

	/// Convert, dispatch and encode in one step
	pub async fn handle(
		&self,
		endpoint: &dyn Endpoint,
		request: http::Request<Bytes>,
		id: Option<&str>,
	) -> http::Response<Bytes> {
		let result = match self.to_api_request(&request, id) {
			Ok(api_request) => endpoint.dispatch(api_request).await,
			Err(err) => Err(err),
		};
		if let Err(err) = &result {
			tracing::debug!(endpoint = endpoint.name(), status = %err.status(), "request failed");
		}
		self.to_http_response(result)
	}
}

impl Default for HttpAdapter {
	fn default() -> Self {
		Self::new()
	}
}

fn codec_error(err: CodecError) -> ApiError {
	ApiError::BadRequest(err.to_string())
}
