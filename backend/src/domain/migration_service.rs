//! Applies and reverts the registered revision chain through a
//! [`MigrationRunner`], and reports where a database sits on that chain.

use serde::Serialize;
use tracing::info;

use crate::domain::ports::{MigrationRunner, MigrationRunnerError};
use crate::domain::revision::RevisionChain;

/// Which registered revisions a database has applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub applied: Vec<String>,
    pub pending: Vec<String>,
    /// Recorded as applied but not registered in this build.
    pub unknown: Vec<String>,
    pub head: Option<String>,
}

impl MigrationStatus {
    /// Classify `applied` versions against `chain`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::{MigrationStatus, registered_migrations};
    ///
    /// let chain = registered_migrations().expect("valid registry");
    /// let status = MigrationStatus::from_chain(&chain, &[]);
    /// assert_eq!(status.pending, vec!["001_initial_schema".to_owned()]);
    /// assert!(!status.is_up_to_date());
    /// ```
    pub fn from_chain(chain: &RevisionChain, applied: &[String]) -> Self {
        let registered: Vec<&str> = chain.units().iter().map(|unit| unit.revision.id).collect();
        Self {
            applied: registered
                .iter()
                .filter(|id| applied.iter().any(|version| version == *id))
                .map(|id| (*id).to_owned())
                .collect(),
            pending: registered
                .iter()
                .filter(|id| !applied.iter().any(|version| version == *id))
                .map(|id| (*id).to_owned())
                .collect(),
            unknown: applied
                .iter()
                .filter(|version| !registered.contains(&version.as_str()))
                .cloned()
                .collect(),
            head: chain.head().map(|revision| revision.id.to_owned()),
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drives a runner over one revision chain.
pub struct SchemaMigrationService<'a> {
    chain: &'a RevisionChain,
}

impl<'a> SchemaMigrationService<'a> {
    pub fn new(chain: &'a RevisionChain) -> Self {
        Self { chain }
    }

    pub fn status(
        &self,
        runner: &mut dyn MigrationRunner,
    ) -> Result<MigrationStatus, MigrationRunnerError> {
        let applied = runner.applied_revisions()?;
        Ok(MigrationStatus::from_chain(self.chain, &applied))
    }

    /// Apply every pending revision; returns the revisions applied.
    pub fn upgrade(
        &self,
        runner: &mut dyn MigrationRunner,
    ) -> Result<Vec<String>, MigrationRunnerError> {
        let applied = runner.apply_pending()?;
        info!(count = applied.len(), revisions = ?applied, "applied pending migrations");
        Ok(applied)
    }

    /// Revert the newest revision, or every revision when `all` is set.
    pub fn downgrade(
        &self,
        runner: &mut dyn MigrationRunner,
        all: bool,
    ) -> Result<Vec<String>, MigrationRunnerError> {
        let reverted = if all {
            runner.revert_all()?
        } else {
            runner.revert_last()?.into_iter().collect()
        };
        info!(count = reverted.len(), revisions = ?reverted, "reverted migrations");
        Ok(reverted)
    }
}
