//! Connection and settings configuration shared by the binaries.
//!
//! The connection string comes from `--database-url` or, failing that,
//! `DATABASE_URL`. It is validated before any database I/O so a missing or
//! malformed value fails fast. Remaining knobs load through OrthoConfig
//! with the `RECRUIT_DB` prefix.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::QualifiedTable;

/// Environment variable consulted when no explicit URL is given.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Schema holding the tables, and the one privileges are granted on.
pub const DEFAULT_SCHEMA: &str = "public";
/// Table where the migration harness records applied revisions.
pub const DEFAULT_VERSION_TABLE: &str = "__diesel_schema_migrations";

const SUPPORTED_SCHEMES: &[&str] = &["postgres", "postgresql"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no database URL: pass --database-url or set {DATABASE_URL_ENV}")]
    MissingDatabaseUrl,
    #[error("invalid database URL: {message}")]
    InvalidDatabaseUrl { message: String },
    #[error("unsupported database URL scheme '{scheme}'; expected postgres:// or postgresql://")]
    UnsupportedScheme { scheme: String },
    #[error("invalid settings: {message}")]
    Settings { message: String },
}

/// A validated PostgreSQL connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    url: Url,
}

impl ConnectionConfig {
    /// Choose the explicit value when present, else the environment value.
    ///
    /// Blank values count as absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::config::ConnectionConfig;
    ///
    /// let config = ConnectionConfig::resolve(
    ///     None,
    ///     Some("postgresql+asyncpg://app:secret@db/recruit".to_owned()),
    /// )
    /// .expect("environment URL is valid");
    /// assert_eq!(config.database_url(), "postgresql://app:secret@db/recruit");
    /// assert_eq!(config.redacted(), "postgresql://app:***@db/recruit");
    /// ```
    pub fn resolve(
        explicit: Option<String>,
        env_value: Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = explicit
            .filter(|value| !value.trim().is_empty())
            .or_else(|| env_value.filter(|value| !value.trim().is_empty()))
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        Self::parse(raw.trim())
    }

    /// [`resolve`](Self::resolve) against the process environment.
    pub fn from_env(explicit: Option<String>) -> Result<Self, ConfigError> {
        Self::resolve(explicit, std::env::var(DATABASE_URL_ENV).ok())
    }

    /// Parse a URL, stripping any `+driver` suffix from the scheme.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let normalized = strip_driver_suffix(raw);
        let url = Url::parse(&normalized).map_err(|error| ConfigError::InvalidDatabaseUrl {
            message: error.to_string(),
        })?;
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            });
        }
        Ok(Self { url })
    }

    pub fn database_url(&self) -> &str {
        self.url.as_str()
    }

    /// The URL with any password replaced by `***`, safe to print.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

fn strip_driver_suffix(raw: &str) -> String {
    let Some((scheme, rest)) = raw.split_once("://") else {
        return raw.to_owned();
    };
    match scheme.split_once('+') {
        Some((base, _driver)) => format!("{base}://{rest}"),
        None => raw.to_owned(),
    }
}

/// Settings beyond the connection string.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECRUIT_DB")]
pub struct DatabaseSettings {
    /// Schema the tables live in.
    #[ortho_config(default = DEFAULT_SCHEMA.to_owned())]
    pub schema: String,
    /// Version table dropped by `reset-migrations`.
    #[ortho_config(default = DEFAULT_VERSION_TABLE.to_owned())]
    pub version_table: String,
}

impl DatabaseSettings {
    /// Load from `RECRUIT_DB_*` environment variables and config files.
    pub fn load_settings() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("recruit-db")]).map_err(|error| {
            ConfigError::Settings {
                message: error.to_string(),
            }
        })
    }

    /// The configured schema; blank values fall back to [`DEFAULT_SCHEMA`].
    pub fn schema(&self) -> &str {
        non_blank(&self.schema).unwrap_or(DEFAULT_SCHEMA)
    }

    pub fn version_table(&self) -> &str {
        non_blank(&self.version_table).unwrap_or(DEFAULT_VERSION_TABLE)
    }

    /// The version table, qualified by the configured schema.
    pub fn qualified_version_table(&self) -> QualifiedTable {
        QualifiedTable::new(self.schema(), self.version_table())
    }

    /// Table `reset-migrations` drops: `table_override` when non-blank,
    /// else the configured version table, both in the configured schema.
    pub fn reset_target(&self, table_override: Option<&str>) -> QualifiedTable {
        match table_override.and_then(non_blank) {
            Some(name) => QualifiedTable::new(self.schema(), name),
            None => self.qualified_version_table(),
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
