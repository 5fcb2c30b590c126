//! Logging setup
//!
//! Structured logging through `tracing`. `RUST_LOG` takes precedence over the
//! configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize logging for the application
///
/// Should be called once at startup. A second call leaves the first
/// subscriber in place.
///
/// # Example
///
/// ```
/// use gate_core::{config::LoggingConfig, logging::init_logging};
///
/// init_logging(&LoggingConfig {
///     level: "debug".to_string(),
///     json: false,
/// });
/// ```
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_target(false))
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!("Logging initialized at level: {}", config.level),
        Err(_) => tracing::debug!("Logging already initialized"),
    }
}
