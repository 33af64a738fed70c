//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by
//! [`LoggingConfig::filter`]. `RUST_LOG`, when set, takes precedence over the
//! configured filter. Library code only emits events; installing the
//! subscriber is left to the application.

use nadctl_domain::{LoggingConfig, NadError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| NadError::Config(format!("invalid log filter {:?}: {e}", config.filter)))
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, so calling
/// this more than once is harmless.
///
/// # Errors
/// Returns `NadError::Config` if the configured filter does not parse.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;

    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr).boxed()
    };

    Ok(tracing_subscriber::registry().with(layer.with_filter(filter)).try_init().is_ok())
}
