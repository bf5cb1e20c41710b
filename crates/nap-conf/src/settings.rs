//! Runtime settings and the layered builder that produces them

use crate::sources::{ConfigSource, SourceError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_RPC_ACTION_HEADER: &str = "X-RPC-Action";
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("Failed to load {source_description}: {error}")]
	Source {
		source_description: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Invalid(#[from] serde_json::Error),
}

/// Settings read by the dispatch layer and logging setup
///
/// Every field has a default, so an empty configuration is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Expose internal error details in responses
	pub debug: bool,
	/// Filter directive used when `RUST_LOG` is unset
	pub log_level: String,
	/// Request header carrying the RPC action name
	pub rpc_action_header: String,
	/// Largest accepted request body in bytes
	pub max_body_size: usize,
	pub pretty_json: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			log_level: DEFAULT_LOG_LEVEL.to_string(),
			rpc_action_header: DEFAULT_RPC_ACTION_HEADER.to_string(),
			max_body_size: DEFAULT_MAX_BODY_SIZE,
			pretty_json: false,
		}
	}
}

impl Settings {
	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}
}

/// Merges [`ConfigSource`]s into [`Settings`]
///
/// Sources are applied in ascending priority, so a key set by a
/// higher-priority source wins. Sources of equal priority apply in the
/// order they were added.
///
/// # Examples
///
/// ```
/// use nap_conf::{DefaultSource, Settings};
/// use serde_json::Value;
///
/// let settings = Settings::builder()
///     .add_source(DefaultSource::new().with_value("max_body_size", Value::from(4096)))
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.max_body_size, 4096);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load and merge every source without deserializing
	pub fn merge(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = IndexMap::new();
		for source in ordered {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_description: source.description(),
				error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"loaded configuration source"
			);
			merged.extend(values);
		}
		Ok(merged)
	}

	pub fn build(self) -> Result<Settings, SettingsError> {
		let merged = self.merge()?;
		let object: serde_json::Map<String, Value> = merged.into_iter().collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}
