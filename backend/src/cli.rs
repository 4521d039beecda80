//! Pieces shared by the operator binaries.

use clap::Args;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ConfigError, ConnectionConfig, DATABASE_URL_ENV};

/// Install the stderr log subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
}

/// `--database-url`, falling back to `DATABASE_URL`.
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseUrlArg {
    /// PostgreSQL connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,
}

impl DatabaseUrlArg {
    pub fn connection(&self) -> Result<ConnectionConfig, ConfigError> {
        ConnectionConfig::from_env(self.database_url.clone())
    }

    /// Name of the fallback environment variable, for help text.
    pub const fn env_name() -> &'static str {
        DATABASE_URL_ENV
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use env_lock::lock_env;
    use rstest::rstest;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        database: DatabaseUrlArg,
    }

    #[rstest]
    fn flag_is_optional_and_defers_to_environment() {
        let _guard = lock_env([(
            DatabaseUrlArg::env_name(),
            Some("postgres://env@localhost/recruit".to_owned()),
        )]);
        let parsed = Harness::try_parse_from(["harness"]).expect("no flags required");
        let config = parsed.database.connection().expect("environment fallback");
        assert_eq!(config.database_url(), "postgres://env@localhost/recruit");
    }

    #[rstest]
    fn missing_url_reports_configuration_error() {
        let _guard = lock_env([(DatabaseUrlArg::env_name(), None::<String>)]);
        let error = DatabaseUrlArg::default()
            .connection()
            .expect_err("no URL anywhere");
        assert_eq!(error, ConfigError::MissingDatabaseUrl);
    }
}
