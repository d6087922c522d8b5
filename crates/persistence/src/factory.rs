//! Design-time context construction.
//!
//! Tooling (the migrator) needs a context without going through application
//! startup. The factory reads `appsettings.json` from a base directory (by default
//! the directory of the running executable), layers the environment-specific file
//! and environment variables on top, and builds a lazily connecting context.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{AppSettings, POSTGRESQL};
use crate::context::EcommerceDbContext;
use crate::error::{PersistenceError, PersistenceResult};

/// Environment variable naming the active environment (`Development`, `Production`, ...).
pub const ENVIRONMENT_VARIABLE: &str = "ECOMMERCE_ENVIRONMENT";

const ENVIRONMENT_ARG: &str = "--environment";

/// Builds a context for design-time tooling from command-line style arguments.
pub trait DesignTimeContextFactory {
    type Context;

    fn create_context(&self, args: &[String]) -> PersistenceResult<Self::Context>;
}

#[derive(Debug, Clone, Default)]
pub struct EcommerceContextFactory {
    base_path: Option<PathBuf>,
    environment: Option<String>,
}

impl EcommerceContextFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from `path` instead of the executable's directory.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Environment used when none is passed with `--environment`.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn base_path(&self) -> PersistenceResult<PathBuf> {
        if let Some(path) = &self.base_path {
            return Ok(path.clone());
        }

        let exe = std::env::current_exe().map_err(|e| {
            PersistenceError::configuration(format!("cannot locate the running executable: {e}"))
        })?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            PersistenceError::configuration(format!(
                "executable path '{}' has no parent directory",
                exe.display()
            ))
        })
    }

    /// `--environment` argument, then the configured environment, then
    /// [`ENVIRONMENT_VARIABLE`].
    pub fn environment(&self, args: &[String]) -> Option<String> {
        environment_from_args(args)
            .or_else(|| self.environment.clone())
            .or_else(|| std::env::var(ENVIRONMENT_VARIABLE).ok())
            .map(|env| env.trim().to_string())
            .filter(|env| !env.is_empty())
    }

    pub fn load_settings(&self, args: &[String]) -> PersistenceResult<AppSettings> {
        let base_path = self.base_path()?;
        let environment = self.environment(args);

        info!(
            base_path = %base_path.display(),
            environment = environment.as_deref().unwrap_or("<none>"),
            "loading design-time settings"
        );
        AppSettings::load(&base_path, environment.as_deref())
    }

    pub fn context_from_settings(
        &self,
        settings: &AppSettings,
    ) -> PersistenceResult<EcommerceDbContext> {
        let connection_string = settings.require_connection_string(POSTGRESQL)?;
        EcommerceDbContext::connect_lazy(connection_string, &settings.database)
    }
}

impl DesignTimeContextFactory for EcommerceContextFactory {
    type Context = EcommerceDbContext;

    fn create_context(&self, args: &[String]) -> PersistenceResult<EcommerceDbContext> {
        let settings = self.load_settings(args)?;
        self.context_from_settings(&settings)
    }
}

/// Value of `--environment <name>` or `--environment=<name>`; the last one wins.
pub fn environment_from_args(args: &[String]) -> Option<String> {
    let mut found = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == ENVIRONMENT_ARG {
            if let Some(value) = iter.next() {
                found = Some(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(ENVIRONMENT_ARG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            found = Some(value.to_string());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SETTINGS_FILE;
    use figment::Jail;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn environment_argument_forms() {
        assert_eq!(
            environment_from_args(&args(&["--environment", "Development"])),
            Some("Development".into())
        );
        assert_eq!(
            environment_from_args(&args(&["up", "--environment=Staging"])),
            Some("Staging".into())
        );
        assert_eq!(
            environment_from_args(&args(&["--environment=A", "--environment", "B"])),
            Some("B".into())
        );
        assert_eq!(environment_from_args(&args(&["--environment"])), None);
        assert_eq!(environment_from_args(&args(&["--environments=x"])), None);
    }

    #[test]
    fn environment_precedence() {
        Jail::expect_with(|jail| {
            jail.set_env(ENVIRONMENT_VARIABLE, "FromEnv");
            let factory = EcommerceContextFactory::new();
            assert_eq!(factory.environment(&[]), Some("FromEnv".into()));

            let factory = factory.with_environment("FromFactory");
            assert_eq!(factory.environment(&[]), Some("FromFactory".into()));
            assert_eq!(
                factory.environment(&args(&["--environment", "FromArgs"])),
                Some("FromArgs".into())
            );
            Ok(())
        });
    }

    #[test]
    fn load_settings_uses_base_path_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                SETTINGS_FILE,
                r#"{ "connection_strings": { "postgresql": "postgres://base/shop" } }"#,
            )?;
            jail.create_file(
                "appsettings.Testing.json",
                r#"{ "connection_strings": { "postgresql": "postgres://testing/shop" } }"#,
            )?;

            let factory = EcommerceContextFactory::new().with_base_path(jail.directory());
            let settings = factory
                .load_settings(&args(&["--environment=Testing"]))
                .map_err(|e| e.to_string())?;
            assert_eq!(
                settings.connection_string(POSTGRESQL),
                Some("postgres://testing/shop")
            );
            Ok(())
        });
    }

    #[test]
    fn missing_settings_file_fails() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let factory = EcommerceContextFactory::new().with_base_path(jail.directory());
            let err = factory.create_context(&[]).unwrap_err();
            assert!(matches!(err, PersistenceError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn missing_connection_string_fails() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(SETTINGS_FILE, "{}")?;

            let factory = EcommerceContextFactory::new().with_base_path(jail.directory());
            let err = factory.create_context(&[]).unwrap_err();
            assert_eq!(
                err.to_string(),
                "configuration error: connection string 'postgresql' was not found"
            );
            Ok(())
        });
    }

    #[test]
    fn create_context_without_runtime_is_a_configuration_error() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                SETTINGS_FILE,
                r#"{ "connection_strings": { "postgresql": "postgres://app@127.0.0.1:1/shop" } }"#,
            )?;

            let factory = EcommerceContextFactory::new().with_base_path(jail.directory());
            let err = factory.create_context(&[]).unwrap_err();
            assert!(matches!(err, PersistenceError::Configuration(_)));
            Ok(())
        });
    }

    #[tokio::test]
    async fn create_context_builds_lazy_context() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                SETTINGS_FILE,
                r#"{ "connection_strings": { "postgresql": "postgres://app@127.0.0.1:1/shop" },
                     "database": { "max_connections": 3 } }"#,
            )?;

            let factory = EcommerceContextFactory::new().with_base_path(jail.directory());
            let context = factory.create_context(&[]).map_err(|e| e.to_string())?;
            assert_eq!(context.pool().options().get_max_connections(), 3);
            Ok(())
        });
    }

    #[test]
    fn default_base_path_is_executable_directory() {
        let expected = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(EcommerceContextFactory::new().base_path().unwrap(), expected);
    }
}
