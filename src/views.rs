//! Resource and RPC endpoints, the JSON codec and the `http` adapter.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[cfg(feature = "views")]
//! use nap::views::{HttpAdapter, InMemoryStore, ResourceView};
//! ```

#[cfg(feature = "views")]
pub use nap_views::*;
