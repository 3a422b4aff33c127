//! Logging setup for the CLI.
//!
//! Installs a single `tracing-subscriber` fmt layer behind an [`EnvFilter`].
//! `RUST_LOG` wins over `application.log_level`; `application.log_format`
//! selects pretty, compact or JSON lines.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::{EditorConfig, LogFormat};

/// Install the global subscriber described by `config`.
///
/// Returns `Ok(())` without changes when a subscriber is already in place,
/// e.g. when several tests initialise logging.
pub fn init_from_config(config: &EditorConfig) -> Result<(), String> {
    let level = parse_log_level(&config.application.log_level)?;
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.application.log_format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| format!("Failed to initialize tracing: {e}"))
}

/// Parse a case-insensitive level name.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    level
        .parse::<Level>()
        .map_err(|_| format!("Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), Ok(Level::TRACE));
        assert_eq!(parse_log_level("INFO"), Ok(Level::INFO));
        assert_eq!(parse_log_level("Debug"), Ok(Level::DEBUG));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_init_twice() {
        let mut config = EditorConfig::default();
        config.application.log_format = LogFormat::Json;
        assert!(init_from_config(&config).is_ok());
        assert!(init_from_config(&EditorConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_level_rejected_before_install() {
        let mut config = EditorConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(init_from_config(&config).is_err());
    }
}
