//! Port for discovering the connected role and granting it privileges.

use crate::domain::permissions::DatabaseIdentity;

use super::define_port_error;

define_port_error! {
    /// Errors raised by privilege repositories.
    pub enum PrivilegeRepositoryError {
        /// The database could not be reached.
        Connection { message: String } =>
            "privilege repository connection failed: {message}",
        /// `current_user` or `current_database()` could not be read.
        Identity { message: String } =>
            "could not determine the connected role: {message}",
        /// A single privilege statement was rejected.
        Statement { message: String } =>
            "privilege statement failed: {message}",
    }
}

/// Executes privilege statements on an autocommit connection.
#[cfg_attr(test, mockall::automock)]
pub trait PrivilegeRepository {
    fn current_identity(&mut self) -> Result<DatabaseIdentity, PrivilegeRepositoryError>;

    /// Run one statement; a failure must not affect later statements.
    fn execute_grant(&mut self, statement: &str) -> Result<(), PrivilegeRepositoryError>;
}
