//! Port for applying and reverting registered migration units.

use super::define_port_error;

define_port_error! {
    /// Errors raised by migration runners.
    pub enum MigrationRunnerError {
        /// The database could not be reached.
        Connection { message: String } =>
            "migration connection failed: {message}",
        /// A migration statement or the version bookkeeping failed.
        Migration { message: String } =>
            "migration failed: {message}",
    }
}

/// Applies migration units and reports the versions it touched.
///
/// Versions are revision ids. Implementations run each unit in its own
/// transaction and record applied units in the version table.
#[cfg_attr(test, mockall::automock)]
pub trait MigrationRunner {
    /// Revision ids recorded as applied, oldest first.
    fn applied_revisions(&mut self) -> Result<Vec<String>, MigrationRunnerError>;

    /// Apply every pending unit in chain order.
    fn apply_pending(&mut self) -> Result<Vec<String>, MigrationRunnerError>;

    /// Revert the most recently applied unit, if any.
    fn revert_last(&mut self) -> Result<Option<String>, MigrationRunnerError>;

    /// Revert every applied unit, newest first.
    fn revert_all(&mut self) -> Result<Vec<String>, MigrationRunnerError>;
}
