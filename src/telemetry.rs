//! Tracing subscriber set-up for the operator binary.

use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Builds the event filter. `RUST_LOG` wins over `level` when set.
#[must_use]
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs a formatting subscriber that writes to stderr.
///
/// Stdout stays reserved for command output.
///
/// # Errors
///
/// Returns [`TelemetryError::Install`] when a global subscriber already
/// exists.
pub fn init(level: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level))
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
