//! Tracing/logging initialization.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging section of the application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingSettings {
    /// `EnvFilter` directives, e.g. `info,sqlx=warn`. `RUST_LOG` wins when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Json,
        }
    }
}

impl TracingSettings {
    /// Resolve the filter: `RUST_LOG` first, then the configured directives,
    /// then `info` if the directives do not parse.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(&TracingSettings::default());
}

/// Initialize tracing/logging with the given settings.
pub fn init_with(settings: &TracingSettings) {
    let filter = settings.env_filter();

    let _ = match settings.format {
        // JSON logs + timestamps, configurable via RUST_LOG.
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_json_info() {
        let settings = TracingSettings::default();
        assert_eq!(settings.filter, "info");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn settings_deserialize_with_partial_input() {
        let settings: TracingSettings =
            serde_json::from_str(r#"{ "format": "pretty" }"#).unwrap();
        assert_eq!(settings.format, LogFormat::Pretty);
        assert_eq!(settings.filter, "info");
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init_with(&TracingSettings {
            filter: "debug".into(),
            format: LogFormat::Pretty,
        });
        ::tracing::info!("still alive");
    }
}
