//! Port for discarding the migration harness's version bookkeeping.

use crate::domain::migration_reset::QualifiedTable;

use super::define_port_error;

define_port_error! {
    /// Errors raised while dropping the version table.
    pub enum MigrationStateRepositoryError {
        /// The database could not be reached.
        Connection { message: String } =>
            "migration state connection failed: {message}",
        /// The drop or its transaction failed and was rolled back.
        Query { message: String } =>
            "migration state reset failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait MigrationStateRepository {
    /// Drop `table` with `CASCADE` inside one transaction.
    ///
    /// Returns whether the table existed beforehand.
    fn drop_version_table(
        &mut self,
        table: &QualifiedTable,
    ) -> Result<bool, MigrationStateRepositoryError>;
}
