//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod migration_runner;
mod migration_state_repository;
mod privilege_repository;
mod schema_snapshot_repository;

#[cfg(test)]
pub use migration_runner::MockMigrationRunner;
pub use migration_runner::{MigrationRunner, MigrationRunnerError};
#[cfg(test)]
pub use migration_state_repository::MockMigrationStateRepository;
pub use migration_state_repository::{MigrationStateRepository, MigrationStateRepositoryError};
#[cfg(test)]
pub use privilege_repository::MockPrivilegeRepository;
pub use privilege_repository::{PrivilegeRepository, PrivilegeRepositoryError};
#[cfg(test)]
pub use schema_snapshot_repository::MockSchemaSnapshotRepository;
pub use schema_snapshot_repository::{
    FixtureSchemaSnapshotRepository, SchemaSnapshotRepository, SchemaSnapshotRepositoryError,
};
