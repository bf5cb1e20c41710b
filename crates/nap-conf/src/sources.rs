//! Configuration sources
//!
//! Each source yields a flat map of setting keys to JSON values. Sources with
//! a higher [`ConfigSource::priority`] override lower ones when merged by
//! [`SettingsBuilder`](crate::SettingsBuilder).

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix read by [`EnvSource::nap`]
pub const ENV_PREFIX: &str = "NAP_";

const BOOL_KEYS: &[&str] = &["debug", "pretty_json"];
const INTEGER_KEYS: &[&str] = &["max_body_size"];

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Fixed values, lowest priority
///
/// # Examples
///
/// ```
/// use nap_conf::{ConfigSource, DefaultSource};
/// use serde_json::Value;
///
/// let source = DefaultSource::new().with_value("debug", Value::Bool(true));
/// assert_eq!(source.load().unwrap()["debug"], Value::Bool(true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Top-level keys of a TOML file
///
/// A missing file loads as an empty map.
#[derive(Debug, Clone)]
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let table: toml::Table = toml::from_str(&content)?;

		// TOML and JSON share a data model for everything a settings file holds
		let json_value = serde_json::to_value(table)?;
		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected a table at the root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Process environment variables, highest priority
///
/// Variables are filtered by prefix, the prefix is stripped and the rest of
/// the name is lowercased: `NAP_MAX_BODY_SIZE=2048` becomes
/// `max_body_size = 2048`.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	/// Load every variable in the environment
	pub fn new() -> Self {
		Self::default()
	}

	/// Load variables starting with [`ENV_PREFIX`]
	pub fn nap() -> Self {
		Self::new().with_prefix(ENV_PREFIX)
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Known boolean and integer settings are typed; everything else stays
	/// a string
	fn parse_value(key: &str, value: String) -> Value {
		if BOOL_KEYS.contains(&key) {
			match value.trim().to_lowercase().as_str() {
				"true" | "1" | "yes" | "on" => return Value::Bool(true),
				"false" | "0" | "no" | "off" => return Value::Bool(false),
				_ => {}
			}
		} else if INTEGER_KEYS.contains(&key)
			&& let Ok(num) = value.trim().parse::<u64>()
		{
			return Value::Number(num.into());
		}
		Value::String(value)
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars() {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest,
					None => continue,
				},
				None => key.as_str(),
			};
			if clean_key.is_empty() {
				continue;
			}

			let lower_key = clean_key.to_lowercase();
			let parsed_value = Self::parse_value(&lower_key, value);
			config.insert(lower_key, parsed_value);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::io::Write;

	#[rstest]
	#[case("debug", "yes", Value::Bool(true))]
	#[case("debug", "0", Value::Bool(false))]
	#[case("pretty_json", "on", Value::Bool(true))]
	#[case("max_body_size", "2048", Value::from(2048))]
	#[case("max_body_size", " 4096 ", Value::from(4096))]
	#[case("max_body_size", "big", Value::from("big"))]
	#[case("other", "false", Value::from("false"))]
	#[case("log_level", "debug", Value::from("debug"))]
	#[case("log_level", "1", Value::from("1"))]
	#[case("rpc_action_header", "true", Value::from("true"))]
	#[case("debug", "maybe", Value::from("maybe"))]
	fn test_env_value_parsing(#[case] key: &str, #[case] raw: &str, #[case] expected: Value) {
		assert_eq!(EnvSource::parse_value(key, raw.to_string()), expected);
	}

	#[rstest]
	#[serial(env)]
	fn test_env_source_strips_prefix() {
		// Arrange
		unsafe {
			std::env::set_var("NAPTEST_LOG_LEVEL", "warn");
			std::env::set_var("NAPTEST_DEBUG", "1");
		}
		let source = EnvSource::new().with_prefix("NAPTEST_");

		// Act
		let loaded = source.load().unwrap();

		// Assert
		assert_eq!(loaded.get("log_level"), Some(&Value::from("warn")));
		assert_eq!(loaded.get("debug"), Some(&Value::Bool(true)));
		assert!(loaded.keys().all(|k| !k.starts_with("naptest")));

		unsafe {
			std::env::remove_var("NAPTEST_LOG_LEVEL");
			std::env::remove_var("NAPTEST_DEBUG");
		}
	}

	#[rstest]
	fn test_missing_toml_file_is_empty() {
		let source = TomlFileSource::new("/nonexistent/nap.toml");

		assert!(source.load().unwrap().is_empty());
	}

	#[rstest]
	fn test_toml_file_is_loaded() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "debug = true\nmax_body_size = 512\nlog_level = \"trace\"").unwrap();
		let source = TomlFileSource::new(file.path());

		// Act
		let loaded = source.load().unwrap();

		// Assert
		assert_eq!(loaded["debug"], Value::Bool(true));
		assert_eq!(loaded["max_body_size"], Value::from(512));
		assert_eq!(loaded["log_level"], Value::from("trace"));
	}

	#[rstest]
	fn test_malformed_toml_is_an_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "debug = ").unwrap();

		let err = TomlFileSource::new(file.path()).load().unwrap_err();

		assert!(matches!(err, SourceError::Toml(_)));
	}

	#[rstest]
	fn test_priorities_are_ordered() {
		assert!(DefaultSource::new().priority() < TomlFileSource::new("x.toml").priority());
		assert!(TomlFileSource::new("x.toml").priority() < EnvSource::nap().priority());
	}
}
