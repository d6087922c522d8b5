//! Configuration loading and representation.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. `<base>/appsettings.json` (required)
//! 2. `<base>/appsettings.<environment>.json` (optional)
//! 3. `ECOMMERCE_*` environment variables, nested with `__`
//!    (`ECOMMERCE_CONNECTION_STRINGS__POSTGRESQL=postgres://...`)

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Json};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;

use ecommerce_observability::TracingSettings;

use crate::error::{PersistenceError, PersistenceResult};

/// Name of the connection string used by the persistence context.
pub const POSTGRESQL: &str = "postgresql";

pub const SETTINGS_FILE: &str = "appsettings.json";

pub const ENV_PREFIX: &str = "ECOMMERCE_";

/// Root of the application settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Named connection strings, e.g. `postgresql`.
    pub connection_strings: BTreeMap<String, String>,
    pub database: DatabaseOptions,
    pub logging: TracingSettings,
}

impl AppSettings {
    /// Build the layered figment for `base_path` without extracting it.
    pub fn figment(base_path: &Path, environment: Option<&str>) -> Figment {
        let mut figment = Figment::new().merge(Json::file(base_path.join(SETTINGS_FILE)));

        if let Some(env) = environment.map(str::trim).filter(|e| !e.is_empty()) {
            figment = figment.merge(Json::file(
                base_path.join(format!("appsettings.{env}.json")),
            ));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from `base_path`, failing if `appsettings.json` is missing.
    pub fn load(base_path: &Path, environment: Option<&str>) -> PersistenceResult<Self> {
        let settings_file = base_path.join(SETTINGS_FILE);
        if !settings_file.is_file() {
            return Err(PersistenceError::configuration(format!(
                "settings file '{}' was not found",
                settings_file.display()
            )));
        }

        let settings = Self::figment(base_path, environment).extract()?;
        Ok(settings)
    }

    /// Look up a connection string by name (case-insensitive). Blank values count as absent.
    pub fn connection_string(&self, name: &str) -> Option<&str> {
        self.connection_strings
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn require_connection_string(&self, name: &str) -> PersistenceResult<&str> {
        self.connection_string(name).ok_or_else(|| {
            PersistenceError::configuration(format!("connection string '{name}' was not found"))
        })
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl DatabaseOptions {
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecommerce_observability::LogFormat;
    use figment::Jail;

    const BASE: &str = r#"{
        "connection_strings": { "postgresql": "postgres://app@localhost/shop" },
        "database": { "max_connections": 5, "acquire_timeout": "5s" },
        "logging": { "filter": "debug", "format": "pretty" }
    }"#;

    #[test]
    fn loads_base_file() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE, BASE)?;

            let settings = AppSettings::load(jail.directory(), None).map_err(|e| e.to_string())?;
            assert_eq!(
                settings.connection_string(POSTGRESQL),
                Some("postgres://app@localhost/shop")
            );
            assert_eq!(settings.database.max_connections, 5);
            assert_eq!(settings.database.min_connections, 0);
            assert_eq!(settings.database.acquire_timeout, Duration::from_secs(5));
            assert_eq!(settings.database.idle_timeout, Some(Duration::from_secs(600)));
            assert_eq!(settings.logging.format, LogFormat::Pretty);
            Ok(())
        });
    }

    #[test]
    fn environment_file_and_variables_override_base() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE, BASE)?;
            jail.create_file(
                "appsettings.Development.json",
                r#"{ "database": { "max_connections": 2 } }"#,
            )?;
            jail.set_env(
                "ECOMMERCE_CONNECTION_STRINGS__POSTGRESQL",
                "postgres://env@localhost/shop",
            );

            let settings = AppSettings::load(jail.directory(), Some("Development"))
                .map_err(|e| e.to_string())?;
            assert_eq!(settings.database.max_connections, 2);
            assert_eq!(settings.database.acquire_timeout, Duration::from_secs(5));
            assert_eq!(
                settings.require_connection_string(POSTGRESQL).unwrap(),
                "postgres://env@localhost/shop"
            );
            Ok(())
        });
    }

    #[test]
    fn missing_environment_file_is_ignored() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE, BASE)?;
            let settings =
                AppSettings::load(jail.directory(), Some("Staging")).map_err(|e| e.to_string())?;
            assert_eq!(settings.database.max_connections, 5);
            Ok(())
        });
    }

    #[test]
    fn missing_base_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppSettings::load(dir.path(), None).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(msg) if msg.contains(SETTINGS_FILE)));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE, r#"{ "database": { "max_connections": "many" } }"#)?;
            let err = AppSettings::load(jail.directory(), None).unwrap_err();
            assert!(matches!(err, PersistenceError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn connection_string_lookup_is_case_insensitive_and_ignores_blanks() {
        let mut settings = AppSettings::default();
        settings
            .connection_strings
            .insert("PostgreSql".into(), " postgres://x ".into());
        settings.connection_strings.insert("reporting".into(), "  ".into());

        assert_eq!(settings.connection_string("postgresql"), Some("postgres://x"));
        assert_eq!(settings.connection_string("reporting"), None);

        let err = settings.require_connection_string("reporting").unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: connection string 'reporting' was not found"
        );
    }
}
