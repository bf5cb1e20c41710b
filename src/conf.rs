//! Layered settings and logging setup.

#[cfg(feature = "conf")]
pub use nap_conf::*;
