//! # nap-conf
//!
//! Layered settings for the nap API layer.
//!
//! [`Settings`] are merged from [`ConfigSource`]s in ascending priority:
//! [`DefaultSource`] (0), [`TomlFileSource`] (50) and [`EnvSource`] (100).
//! [`init_logging`] installs a `tracing-subscriber` fmt subscriber filtered by
//! the configured level.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nap_conf::{EnvSource, Settings, TomlFileSource, init_logging};
//!
//! let settings = Settings::builder()
//!     .add_source(TomlFileSource::new("nap.toml"))
//!     .add_source(EnvSource::nap())
//!     .build()
//!     .unwrap();
//! init_logging(&settings);
//! ```

pub mod logging;
pub mod settings;
pub mod sources;

pub use logging::{env_filter, init_logging};
pub use settings::{
	DEFAULT_LOG_LEVEL, DEFAULT_MAX_BODY_SIZE, DEFAULT_RPC_ACTION_HEADER, Settings,
	SettingsBuilder, SettingsError,
};
pub use sources::{ConfigSource, DefaultSource, ENV_PREFIX, EnvSource, SourceError, TomlFileSource};
