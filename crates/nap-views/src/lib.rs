//! # nap-views
//!
//! Dispatch layer mapping requests onto serializers and stores.
//!
//! ## Endpoints
//!
//! - [`ResourceView`]: maps verb and identifier presence to list, detail,
//!   create, update, partial update or delete, and runs the serializer and
//!   [`Store`] calls for it.
//! - [`RpcView`]: runs named actions from an [`ActionRegistry`].
//!
//! Both implement [`Endpoint`]. [`HttpAdapter`] converts `http` requests into
//! [`ApiRequest`]s and encodes outcomes with [`JsonCodec`].
//!
//! ## Routing table
//!
//! | Verb | Has ID | Operation |
//! |---|---|---|
//! | GET | no | list |
//! | GET | yes | detail |
//! | POST | no | create |
//! | PUT | yes | update |
//! | PATCH | yes | partial update |
//! | DELETE | yes | delete |
//!
//! Any other combination yields [`ApiError::MethodNotAllowed`].

pub mod actions;
pub mod adapter;
pub mod codec;
pub mod exception;
pub mod operation;
pub mod request;
pub mod resource_view;
pub mod response;
pub mod store;

pub use actions::{
	ActionFuture, ActionHandler, ActionInput, ActionRegistry, DEFAULT_ACTION_HEADER,
	FunctionActionHandler, RpcAction, RpcView,
};
pub use adapter::{DEFAULT_MAX_BODY_SIZE, HttpAdapter};
pub use codec::{CodecError, JSON_CONTENT_TYPE, JsonCodec};
pub use exception::{ApiError, ApiResult};
pub use operation::Operation;
pub use request::ApiRequest;
pub use resource_view::{Endpoint, ResourceView};
pub use response::Response;
pub use store::{Filter, InMemoryStore, Store, StoreError};
