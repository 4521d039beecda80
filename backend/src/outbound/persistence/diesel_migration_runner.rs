//! Diesel migration harness driven by the registered revision chain.
//!
//! Each [`MigrationUnit`] becomes a Diesel [`Migration`] whose version is the
//! revision id. The harness runs every unit in its own transaction and keeps
//! applied versions in `__diesel_schema_migrations`.

use std::fmt;

use diesel::Connection;
use diesel::connection::BoxableConnection;
use diesel::migration::{
    Migration, MigrationMetadata, MigrationName, MigrationSource, MigrationVersion,
    Result as MigrationResult,
};
use diesel::pg::{Pg, PgConnection};
use diesel_migrations::MigrationHarness;
use tracing::debug;

use crate::domain::{MigrationUnit, RevisionChain};
use crate::domain::ports::{MigrationRunner, MigrationRunnerError};

/// Revision id as a Diesel migration name and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionName {
    version: String,
}

impl fmt::Display for RevisionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

impl MigrationName for RevisionName {
    fn version(&self) -> MigrationVersion<'_> {
        MigrationVersion::from(self.version.clone())
    }
}

/// One revision with its rendered upgrade and downgrade scripts.
#[derive(Debug, Clone)]
pub struct ChainMigration {
    name: RevisionName,
    upgrade: String,
    downgrade: String,
}

#[derive(Debug, Clone, Copy)]
struct Transactional;

impl MigrationMetadata for Transactional {}

impl ChainMigration {
    pub fn from_unit(unit: &MigrationUnit) -> Self {
        Self {
            name: RevisionName {
                version: unit.revision.id.to_owned(),
            },
            upgrade: unit.upgrade_sql(),
            downgrade: unit.downgrade_sql(),
        }
    }

    pub fn upgrade_sql(&self) -> &str {
        &self.upgrade
    }

    pub fn downgrade_sql(&self) -> &str {
        &self.downgrade
    }
}

impl Migration<Pg> for ChainMigration {
    fn run(&self, conn: &mut dyn BoxableConnection<Pg>) -> MigrationResult<()> {
        debug!(revision = %self.name, "running upgrade");
        conn.batch_execute(&self.upgrade)?;
        Ok(())
    }

    fn revert(&self, conn: &mut dyn BoxableConnection<Pg>) -> MigrationResult<()> {
        debug!(revision = %self.name, "running downgrade");
        conn.batch_execute(&self.downgrade)?;
        Ok(())
    }

    fn metadata(&self) -> &dyn MigrationMetadata {
        &Transactional
    }

    fn name(&self) -> &dyn MigrationName {
        &self.name
    }
}

/// Every unit of a chain, in chain order.
#[derive(Debug, Clone)]
pub struct ChainMigrationSource {
    migrations: Vec<ChainMigration>,
}

impl ChainMigrationSource {
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::registered_migrations;
    /// use recruit_db::outbound::persistence::ChainMigrationSource;
    ///
    /// let chain = registered_migrations().expect("valid registry");
    /// let source = ChainMigrationSource::from_chain(&chain);
    /// assert_eq!(source.versions(), vec!["001_initial_schema"]);
    /// ```
    pub fn from_chain(chain: &RevisionChain) -> Self {
        Self {
            migrations: chain.units().iter().map(ChainMigration::from_unit).collect(),
        }
    }

    pub fn versions(&self) -> Vec<String> {
        self.migrations
            .iter()
            .map(|migration| migration.name.to_string())
            .collect()
    }
}

impl MigrationSource<Pg> for ChainMigrationSource {
    fn migrations(&self) -> MigrationResult<Vec<Box<dyn Migration<Pg>>>> {
        Ok(self
            .migrations
            .iter()
            .cloned()
            .map(|migration| Box::new(migration) as Box<dyn Migration<Pg>>)
            .collect())
    }
}

/// [`MigrationRunner`] over a synchronous Diesel connection.
pub struct DieselMigrationRunner {
    connection: PgConnection,
    source: ChainMigrationSource,
}

impl DieselMigrationRunner {
    pub fn connect(database_url: &str, chain: &RevisionChain) -> Result<Self, MigrationRunnerError> {
        let connection = PgConnection::establish(database_url)
            .map_err(|error| MigrationRunnerError::connection(error.to_string()))?;
        Ok(Self {
            connection,
            source: ChainMigrationSource::from_chain(chain),
        })
    }
}

fn versions_to_strings<'a>(
    versions: impl IntoIterator<Item = MigrationVersion<'a>>,
) -> Vec<String> {
    versions.into_iter().map(|version| version.to_string()).collect()
}

impl MigrationRunner for DieselMigrationRunner {
    fn applied_revisions(&mut self) -> Result<Vec<String>, MigrationRunnerError> {
        let mut applied = self
            .connection
            .applied_migrations()
            .map(versions_to_strings)
            .map_err(|error| MigrationRunnerError::migration(error.to_string()))?;
        applied.sort();
        Ok(applied)
    }

    fn apply_pending(&mut self) -> Result<Vec<String>, MigrationRunnerError> {
        self.connection
            .run_pending_migrations(self.source.clone())
            .map(versions_to_strings)
            .map_err(|error| MigrationRunnerError::migration(error.to_string()))
    }

    fn revert_last(&mut self) -> Result<Option<String>, MigrationRunnerError> {
        // The harness treats an empty version table as an error.
        if self.applied_revisions()?.is_empty() {
            return Ok(None);
        }
        self.connection
            .revert_last_migration(self.source.clone())
            .map(|version| Some(version.to_string()))
            .map_err(|error| MigrationRunnerError::migration(error.to_string()))
    }

    fn revert_all(&mut self) -> Result<Vec<String>, MigrationRunnerError> {
        self.connection
            .revert_all_migrations(self.source.clone())
            .map(versions_to_strings)
            .map_err(|error| MigrationRunnerError::migration(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registered_migrations;
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> ChainMigrationSource {
        let chain = registered_migrations().expect("registered migrations should be valid");
        ChainMigrationSource::from_chain(&chain)
    }

    #[rstest]
    fn migration_versions_are_revision_ids(source: ChainMigrationSource) {
        let migrations =
            MigrationSource::<Pg>::migrations(&source).expect("source should list migrations");
        let versions: Vec<String> = migrations
            .iter()
            .map(|migration| migration.name().version().to_string())
            .collect();
        assert_eq!(versions, source.versions());
        assert_eq!(versions, vec!["001_initial_schema"]);
    }

    #[rstest]
    fn units_run_in_a_transaction(source: ChainMigrationSource) {
        let migrations =
            MigrationSource::<Pg>::migrations(&source).expect("source should list migrations");
        assert!(
            migrations
                .iter()
                .all(|migration| migration.metadata().run_in_transaction())
        );
    }

    #[rstest]
    fn scripts_create_and_drop_the_schema(source: ChainMigrationSource) {
        let initial = &source.migrations[0];
        assert!(initial.upgrade_sql().contains("CREATE TYPE"));
        assert!(initial.upgrade_sql().contains("CREATE TABLE"));
        assert!(initial.downgrade_sql().contains("DROP TABLE"));
        assert!(initial.downgrade_sql().contains("DROP TYPE"));
    }
}
