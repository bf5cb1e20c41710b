//! Business-rule validators attached to fields
//!
//! Validators run only after a value has been coerced, so they can assume
//! the field's native type. Values of any other type (including `Null`) are
//! accepted, leaving type errors to coercion.

use crate::value::NativeValue;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// Extra rule checked after successful coercion
pub trait Validator: Send + Sync {
	/// Return `Err(message)` when the value breaks the rule
	fn validate(&self, value: &NativeValue) -> Result<(), String>;
}

/// Numeric limit kept in the type it was declared with
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
	Int(i64),
	Float(f64),
}

impl Bound {
	/// Order of `value` relative to the bound; integers compare exactly
	fn compare(&self, value: &NativeValue) -> Option<Ordering> {
		match (self, value) {
			(Bound::Int(limit), NativeValue::Int(n)) => Some(n.cmp(limit)),
			(Bound::Int(limit), other) => other.as_f64()?.partial_cmp(&(*limit as f64)),
			(Bound::Float(limit), other) => other.as_f64()?.partial_cmp(limit),
		}
	}
}

impl fmt::Display for Bound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Bound::Int(limit) => write!(f, "{}", limit),
			Bound::Float(limit) => write!(f, "{}", limit),
		}
	}
}

/// Lower bound for numeric values
///
/// # Examples
///
/// ```
/// use nap_core::validators::{MinValue, Validator};
/// use nap_core::NativeValue;
///
/// let validator = MinValue::new(0);
/// assert!(validator.validate(&NativeValue::Int(0)).is_ok());
/// assert_eq!(validator.validate(&NativeValue::Int(-1)), Err("must be >= 0".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct MinValue {
	limit: Bound,
}

impl MinValue {
	pub fn new(limit: i64) -> Self {
		Self {
			limit: Bound::Int(limit),
		}
	}

	pub fn float(limit: f64) -> Self {
		Self {
			limit: Bound::Float(limit),
		}
	}
}

impl Validator for MinValue {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match self.limit.compare(value) {
			Some(Ordering::Less) => Err(format!("must be >= {}", self.limit)),
			_ => Ok(()),
		}
	}
}

/// Upper bound for numeric values
#[derive(Debug, Clone)]
pub struct MaxValue {
	limit: Bound,
}

impl MaxValue {
	pub fn new(limit: i64) -> Self {
		Self {
			limit: Bound::Int(limit),
		}
	}

	pub fn float(limit: f64) -> Self {
		Self {
			limit: Bound::Float(limit),
		}
	}
}

impl Validator for MaxValue {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match self.limit.compare(value) {
			Some(Ordering::Greater) => Err(format!("must be <= {}", self.limit)),
			_ => Ok(()),
		}
	}
}

fn length_of(value: &NativeValue) -> Option<usize> {
	match value {
		NativeValue::Text(s) => Some(s.chars().count()),
		NativeValue::List(items) => Some(items.len()),
		_ => None,
	}
}

/// Minimum length of a string (in characters) or list
#[derive(Debug, Clone)]
pub struct MinLength(pub usize);

impl Validator for MinLength {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match length_of(value) {
			Some(len) if len < self.0 => Err(format!("length must be >= {}", self.0)),
			_ => Ok(()),
		}
	}
}

/// Maximum length of a string (in characters) or list
#[derive(Debug, Clone)]
pub struct MaxLength(pub usize);

impl Validator for MaxLength {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match length_of(value) {
			Some(len) if len > self.0 => Err(format!("length must be <= {}", self.0)),
			_ => Ok(()),
		}
	}
}

/// Rejects strings that are empty after trimming whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct NotBlank;

impl Validator for NotBlank {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match value {
			NativeValue::Text(s) if s.trim().is_empty() => Err("may not be blank".to_string()),
			_ => Ok(()),
		}
	}
}

/// Restricts a value to a fixed set, compared by string form
///
/// # Examples
///
/// ```
/// use nap_core::validators::{Choices, Validator};
/// use nap_core::NativeValue;
///
/// let validator = Choices::new(["draft", "published"]);
/// assert!(validator.validate(&NativeValue::from("draft")).is_ok());
/// assert_eq!(
///     validator.validate(&NativeValue::from("deleted")),
///     Err("\"deleted\" is not a valid choice".to_string())
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Choices {
	choices: Vec<String>,
}

impl Choices {
	pub fn new<I, S>(choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			choices: choices.into_iter().map(Into::into).collect(),
		}
	}

	pub fn choices(&self) -> &[String] {
		&self.choices
	}
}

impl Validator for Choices {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		if value.is_null() {
			return Ok(());
		}
		let candidate = value.to_query_string();
		if self.choices.iter().any(|choice| *choice == candidate) {
			Ok(())
		} else {
			Err(format!("\"{}\" is not a valid choice", candidate))
		}
	}
}

/// Requires strings to match a regular expression
#[derive(Debug, Clone)]
pub struct RegexValidator {
	regex: Regex,
}

impl RegexValidator {
	/// Compile the pattern
	///
	/// # Examples
	///
	/// ```
	/// use nap_core::validators::{RegexValidator, Validator};
	/// use nap_core::NativeValue;
	///
	/// let validator = RegexValidator::new(r"^[a-z0-9-]+$").unwrap();
	/// assert!(validator.validate(&NativeValue::from("hello-world")).is_ok());
	/// assert!(validator.validate(&NativeValue::from("Hello World")).is_err());
	/// ```
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		Ok(Self {
			regex: Regex::new(pattern)?,
		})
	}
}

impl Validator for RegexValidator {
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		match value {
			NativeValue::Text(s) if !self.regex.is_match(s) => Err(format!(
				"does not match pattern '{}'",
				self.regex.as_str()
			)),
			_ => Ok(()),
		}
	}
}

/// Adapts a closure into a [`Validator`]
pub struct FnValidator<F>(pub F);

impl<F> Validator for FnValidator<F>
where
	F: Fn(&NativeValue) -> Result<(), String> + Send + Sync,
{
	fn validate(&self, value: &NativeValue) -> Result<(), String> {
		(self.0)(value)
	}
}

impl<F> fmt::Debug for FnValidator<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("FnValidator")
	}
}
