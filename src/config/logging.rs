//! `[logging]` section.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One line per event, no span context
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "unknown log format '{}' (expected pretty, compact or json)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for everything not listed in `modules`
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels keyed by module path below the crate,
    /// e.g. `stream = "debug"`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            // The REPL shares the terminal with log output
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            modules: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_quiet() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_format_parse_and_display_agree() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>(), Ok(format));
        }
        assert_eq!(" JSON ".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().unwrap_err().contains("xml"));
    }

    #[test]
    fn test_module_levels_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            level = "info"
            format = "compact"
            [modules]
            stream = "debug"
            "hub::client" = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.modules.get("stream").map(String::as_str), Some("debug"));
        assert_eq!(config.modules.len(), 2);
    }

    #[test]
    fn test_empty_modules_not_serialized() {
        let out = toml::to_string(&LoggingConfig::default()).unwrap();
        assert!(!out.contains("modules"));
    }
}
