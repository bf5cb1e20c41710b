//! Values, fields, serializers and validators.
//!
//! # Examples
//!
//! ```rust
//! use nap::core::{Field, Serializer};
//!
//! let serializer = Serializer::builder("TagSerializer")
//!     .field(Field::string("label"))
//!     .build()
//!     .unwrap();
//! assert_eq!(serializer.fields().len(), 1);
//! ```

pub use nap_core::*;
