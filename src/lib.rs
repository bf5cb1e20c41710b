//! # nap
//!
//! A small serializer and dispatch layer for JSON APIs.
//!
//! Declare a [`Serializer`] once and use it in both directions: to turn
//! application objects into ordered wire mappings and to turn untrusted input
//! into validated data with every field error reported at once. Put it behind a
//! [`ResourceView`](views::ResourceView) to get list, detail, create, update,
//! partial update and delete over a [`Store`](views::Store), or register named
//! procedures in an [`ActionRegistry`](views::ActionRegistry).
//!
//! ## Feature Flags
//!
//! - `views` (default) - resource and RPC endpoints, JSON codec, `http` adapter
//! - `conf` (default) - layered settings and logging initialisation
//!
//! The serializer engine in [`core`] is always available.
//!
//! ## Quick Example
//!
//! ```rust
//! use nap::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let serializer = Serializer::builder("PersonSerializer")
//!     .field(Field::integer("id").read_only())
//!     .field(Field::string("name"))
//!     .build()
//!     .unwrap();
//! let people = ResourceView::new("people", Arc::new(serializer), Arc::new(InMemoryStore::new()));
//!
//! let created = people
//!     .dispatch(ApiRequest::post().with_body(serde_json::json!({"name": "Ann"})))
//!     .await
//!     .unwrap();
//! assert_eq!(created.status, StatusCode::CREATED);
//! # });
//! ```

#[cfg(feature = "conf")]
pub mod conf;
pub mod core;
#[cfg(feature = "views")]
pub mod views;

pub use nap_core::{
	Field, FieldKind, NativeValue, Record, Resource, Serializer, ValidatedData, ValidationErrors,
	WireObject, WireValue, record,
};

#[cfg(feature = "views")]
pub use http::{Method, StatusCode};

#[cfg(feature = "conf")]
pub use nap_conf::{Settings, init_logging};

/// Build an [`HttpAdapter`](views::HttpAdapter) configured from [`Settings`]
///
/// # Examples
///
/// ```rust
/// use nap::{Settings, adapter_from_settings};
///
/// let settings = Settings {
///     max_body_size: 512,
///     ..Settings::default()
/// };
/// let adapter = adapter_from_settings(&settings).unwrap();
/// assert_eq!(adapter.max_body_size(), 512);
/// assert_eq!(adapter.action_header().as_str(), "x-rpc-action");
/// ```
#[cfg(all(feature = "views", feature = "conf"))]
pub fn adapter_from_settings(
	settings: &Settings,
) -> Result<views::HttpAdapter, http::header::InvalidHeaderName> {
	Ok(views::HttpAdapter::new()
		.with_codec(views::JsonCodec::new().pretty(settings.pretty_json))
		.with_max_body_size(settings.max_body_size)
		.with_debug(settings.debug)
		.with_action_header(&settings.rpc_action_header)?)
}

pub mod prelude {
	pub use crate::core::{
		DeclarationError, ErrorDetail, Field, FieldKind, NativeValue, Record, Resource, Serializer,
		SerializerError, ValidatedData, ValidationErrors, Validator, WireObject, WireValue, record,
	};

	#[cfg(feature = "views")]
	pub use crate::views::{
		ActionInput, ActionRegistry, ApiError, ApiRequest, ApiResult, Endpoint, Filter,
		FunctionActionHandler, HttpAdapter, InMemoryStore, ResourceView, Response, RpcAction,
		RpcView, Store,
	};
	#[cfg(feature = "views")]
	pub use crate::{Method, StatusCode};

	#[cfg(feature = "conf")]
	pub use crate::conf::{EnvSource, Settings, TomlFileSource, init_logging};

	#[cfg(all(feature = "views", feature = "conf"))]
	pub use crate::adapter_from_settings;
}
