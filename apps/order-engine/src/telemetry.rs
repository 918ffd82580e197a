//! Tracing Setup
//!
//! Initializes the `tracing` subscriber from [`LoggingConfig`].
//!
//! # Configuration
//!
//! - `RUST_LOG`: overrides `logging.level` when set
//! - `logging.format`: `text` (human readable) or `json` (one object per line)
//! - `logging.include_spans`: also log span open/close events
//!
//! Logs go to stderr; stdout carries the engine's outbound records.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_engine::telemetry::init_logging;
//!
//! let config = order_engine::config::load_config(None)?;
//! init_logging(&config.logging)?;
//! ```

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Error returned when the subscriber cannot be installed.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_ascii_lowercase()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    if config.is_json() {
        builder.json().with_current_span(config.include_spans).try_init()?;
    } else {
        builder
            .with_target(false)
            .with_ansi(std::io::stderr().is_terminal())
            .try_init()?;
    }

    tracing::info!(
        level = %config.level,
        format = %config.format,
        include_spans = config.include_spans,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        // Another test may already own the global subscriber.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
