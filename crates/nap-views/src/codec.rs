//! JSON wire codec between transport bodies and wire values

use bytes::Bytes;
use nap_core::WireValue;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
	#[error("Malformed JSON body: {0}")]
	Decode(#[from] serde_json::Error),
}

/// Encodes and decodes bodies as JSON
///
/// # Examples
///
/// ```
/// use nap_views::JsonCodec;
/// use serde_json::json;
///
/// let codec = JsonCodec::new();
/// let bytes = codec.encode(&json!({"b": 1, "a": 2})).unwrap();
/// assert_eq!(&bytes[..], br#"{"b":1,"a":2}"#);
/// assert_eq!(codec.decode(&bytes).unwrap(), Some(json!({"b": 1, "a": 2})));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
	pretty: bool,
}

impl JsonCodec {
	pub fn new() -> Self {
		Self::default()
	}

	/// Indent encoded output
	pub fn pretty(mut self, pretty: bool) -> Self {
		self.pretty = pretty;
		self
	}

	pub fn content_type(&self) -> &'static str {
		JSON_CONTENT_TYPE
	}

	/// Decode a body; an empty or whitespace-only body is `None`
	pub fn decode(&self, body: &[u8]) -> Result<Option<WireValue>, CodecError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}
		Ok(Some(serde_json::from_slice(body)?))
	}

	pub fn encode(&self, value: &WireValue) -> Result<Bytes, CodecError> {
		let bytes = if self.pretty {
			serde_json::to_vec_pretty(value)?
		} else {
			serde_json::to_vec(value)?
		};
		Ok(Bytes::from(bytes))
	}
}
