//! Tracing subscriber setup.
//!
//! The interactive console writes its prompt to stdout, so logs always go to
//! stderr.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives for the configured base level plus per-module levels.
///
/// ```
/// use edge_console::config::LoggingConfig;
/// use edge_console::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.level = "info".to_string();
/// config.modules.insert("stream".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,edge_console::stream=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    config
        .modules
        .iter()
        .fold(config.level.clone(), |mut directives, (module, level)| {
            directives.push_str(&format!(",edge_console::{}={}", module, level));
            directives
        })
}

/// Install the global subscriber. `RUST_LOG` wins over the configuration.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(build_filter_directives(config)))?;

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}
