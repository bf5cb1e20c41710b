//! Global tracing subscriber setup

use crate::settings::Settings;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Build the filter: `RUST_LOG` when set and valid, otherwise the configured
/// level, otherwise `info`
pub fn env_filter(settings: &Settings) -> EnvFilter {
	EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.log_level))
		.unwrap_or_else(|_| EnvFilter::new(crate::settings::DEFAULT_LOG_LEVEL))
}

/// Install a fmt subscriber as the global default
///
/// Returns `false` when a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_logging(settings: &Settings) -> bool {
	let installed = tracing_subscriber::registry()
		.with(env_filter(settings))
		.with(fmt::layer().with_target(true))
		.try_init()
		.is_ok();

	if installed {
		tracing::debug!(level = %settings.log_level, debug = settings.debug, "logging initialized");
	}
	installed
}
