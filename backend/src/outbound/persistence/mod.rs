//! PostgreSQL adapters for the migration, audit and administration ports.
//!
//! - `DieselMigrationRunner` drives Diesel's migration harness over the
//!   registered revision chain on a synchronous `PgConnection`.
//! - `PostgresSchemaSnapshotRepository` reads enums, tables, foreign keys and
//!   indexes from `pg_catalog` for one schema.
//! - `PostgresAdminRepository` runs grants and version-table resets on an
//!   autocommit `postgres` client.
//!
//! # Example
//!
//! ```ignore
//! use recruit_db::domain::{SchemaMigrationService, registered_migrations};
//! use recruit_db::outbound::persistence::DieselMigrationRunner;
//!
//! let chain = registered_migrations()?;
//! let mut runner = DieselMigrationRunner::connect("postgres://localhost/recruit", &chain)?;
//! let applied = SchemaMigrationService::new(&chain).upgrade(&mut runner)?;
//! ```

mod diesel_migration_runner;
mod postgres_admin_repository;
mod postgres_error;
mod postgres_schema_snapshot_repository;

pub use diesel_migration_runner::{
    ChainMigration, ChainMigrationSource, DieselMigrationRunner, RevisionName,
};
pub use postgres_admin_repository::{AdminConnectionError, PostgresAdminRepository};
pub use postgres_error::format_postgres_error;
pub use postgres_schema_snapshot_repository::PostgresSchemaSnapshotRepository;
