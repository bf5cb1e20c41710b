//! Verb and identifier routing for resource endpoints

use http::Method;
use std::fmt;

/// One of the six operations a resource endpoint can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	List,
	Detail,
	Create,
	Update,
	PartialUpdate,
	Delete,
}

impl Operation {
	pub const ALL: [Operation; 6] = [
		Operation::List,
		Operation::Detail,
		Operation::Create,
		Operation::Update,
		Operation::PartialUpdate,
		Operation::Delete,
	];

	/// Map a verb and the presence of a resource identifier to an operation
	///
	/// Returns `None` for combinations outside the routing table, which
	/// endpoints report as method-not-allowed.
	///
	/// # Examples
	///
	/// ```
	/// use http::Method;
	/// use nap_views::Operation;
	///
	/// assert_eq!(Operation::resolve(&Method::GET, false), Some(Operation::List));
	/// assert_eq!(Operation::resolve(&Method::PATCH, true), Some(Operation::PartialUpdate));
	/// assert_eq!(Operation::resolve(&Method::POST, true), None);
	/// ```
	pub fn resolve(method: &Method, has_id: bool) -> Option<Self> {
		match (method, has_id) {
			(&Method::GET, false) => Some(Operation::List),
			(&Method::GET, true) => Some(Operation::Detail),
			(&Method::POST, false) => Some(Operation::Create),
			(&Method::PUT, true) => Some(Operation::Update),
			(&Method::PATCH, true) => Some(Operation::PartialUpdate),
			(&Method::DELETE, true) => Some(Operation::Delete),
			_ => None,
		}
	}

	pub fn method(&self) -> Method {
		match self {
			Operation::List | Operation::Detail => Method::GET,
			Operation::Create => Method::POST,
			Operation::Update => Method::PUT,
			Operation::PartialUpdate => Method::PATCH,
			Operation::Delete => Method::DELETE,
		}
	}

	/// Whether the operation addresses a single resource
	pub fn is_detail(&self) -> bool {
		!matches!(self, Operation::List | Operation::Create)
	}

	/// Whether deserialize runs in partial mode for this operation
	pub fn is_partial(&self) -> bool {
		matches!(self, Operation::PartialUpdate)
	}

	pub fn name(&self) -> &'static str {
		match self {
			Operation::List => "list",
			Operation::Detail => "detail",
			Operation::Create => "create",
			Operation::Update => "update",
			Operation::PartialUpdate => "partial_update",
			Operation::Delete => "delete",
		}
	}

	/// Verbs accepted for a URL shape among `operations`, in table order
	pub fn allowed_methods(operations: &[Operation], has_id: bool) -> Vec<Method> {
		let mut methods = Vec::new();
		for operation in Operation::ALL {
			if operation.is_detail() == has_id && operations.contains(&operation) {
				let method = operation.method();
				if !methods.contains(&method) {
					methods.push(method);
				}
			}
		}
		methods
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
