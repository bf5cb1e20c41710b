//! Log events emitted while dispatching

use nap_core::SerializerError;
use nap_views::{ActionRegistry, ApiError, StoreError};
use rstest::rstest;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A tracing layer that captures events as `[LEVEL] message`
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);
		self.logs.lock().unwrap().push(format!(
			"[{}] {}",
			event.metadata().level(),
			visitor.message
		));
	}
}

fn capture() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
	let logs = Arc::new(Mutex::new(Vec::new()));
	let guard = tracing_subscriber::registry()
		.with(LogCapture { logs: logs.clone() })
		.set_default();
	(logs, guard)
}

#[rstest]
#[tokio::test]
async fn test_unknown_action_logs_warning() {
	// Arrange
	let (logs, _guard) = capture();
	let registry = ActionRegistry::new();

	// Act
	let _ = registry.dispatch("missing", None).await;

	// Assert
	let captured = logs.lock().unwrap();
	assert!(
		captured
			.iter()
			.any(|log| log.starts_with("[WARN]") && log.contains("unknown RPC action")),
		"expected a warning, got: {:?}",
		*captured
	);
}

#[rstest]
fn test_server_errors_are_logged_and_hidden() {
	// Arrange
	let (logs, _guard) = capture();
	let err = ApiError::Store(StoreError::Backend("password=hunter2".into()));

	// Act
	let response = err.into_response(false);

	// Assert
	let body = response.body.unwrap().to_string();
	assert!(!body.contains("hunter2"));
	let captured = logs.lock().unwrap();
	assert!(captured.iter().any(|log| log.starts_with("[ERROR]")));
}

#[rstest]
fn test_client_errors_are_not_logged_as_errors() {
	let (logs, _guard) = capture();

	let _ = ApiError::NotFound("1".into()).into_response(false);
	let _ = ApiError::Serializer(SerializerError::attribute_missing("a", "a")).into_response(true);

	let captured = logs.lock().unwrap();
	assert_eq!(
		captured.iter().filter(|log| log.starts_with("[ERROR]")).count(),
		1
	);
}
