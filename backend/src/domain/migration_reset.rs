//! Discards migration bookkeeping so a database can be re-baselined.

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::domain::ports::{MigrationStateRepository, MigrationStateRepositoryError};
use crate::domain::schema::ddl::quote_identifier;

/// A table name with the schema it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedTable {
    pub schema: String,
    pub name: String,
}

impl QualifiedTable {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Quoted `schema.name` for use in statements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::QualifiedTable;
    ///
    /// let table = QualifiedTable::new("public", "__diesel_schema_migrations");
    /// assert_eq!(table.sql(), "public.__diesel_schema_migrations");
    /// ```
    pub fn sql(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.name)
        )
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Dropped,
    /// Nothing to drop; treated as success.
    AlreadyAbsent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationResetError {
    #[error("version table name must not be empty")]
    EmptyTableName,
    #[error("failed to reset {table}: {source}")]
    Repository {
        table: String,
        #[source]
        source: MigrationStateRepositoryError,
    },
}

/// Drops the version table of the migration harness.
#[derive(Debug, Clone)]
pub struct MigrationStateResetService {
    table: QualifiedTable,
}

impl MigrationStateResetService {
    pub fn new(table: QualifiedTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &QualifiedTable {
        &self.table
    }

    pub fn reset(
        &self,
        repository: &mut dyn MigrationStateRepository,
    ) -> Result<ResetOutcome, MigrationResetError> {
        if self.table.name.trim().is_empty() || self.table.schema.trim().is_empty() {
            return Err(MigrationResetError::EmptyTableName);
        }

        let existed = repository
            .drop_version_table(&self.table)
            .map_err(|source| MigrationResetError::Repository {
                table: self.table.to_string(),
                source,
            })?;

        let outcome = if existed {
            ResetOutcome::Dropped
        } else {
            ResetOutcome::AlreadyAbsent
        };
        info!(table = %self.table, ?outcome, "migration state reset");
        Ok(outcome)
    }
}
