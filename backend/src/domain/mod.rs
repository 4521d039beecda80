//! Schema descriptors, migration identity and the administration services.
//!
//! Public surface:
//! - `schema`: descriptor types, validation, DDL rendering, the initial schema.
//! - `RevisionChain` / `registered_migrations`: migration units and their order.
//! - `SchemaAuditReport`: live schema compared with the descriptor.
//! - `PermissionRepairService`: best-effort privilege grants with a report.
//! - `MigrationStateResetService`: drops the version table.

pub mod enumerations;
pub mod er_diagram;
pub mod migration_reset;
pub mod migration_service;
pub mod permissions;
pub mod ports;
pub mod revision;
pub mod schema;
pub mod schema_audit;

pub use self::enumerations::{PersistedEnum, TestStatus, UnknownEnumLabel, UserRole};
pub use self::er_diagram::{
    SchemaColumn, SchemaDiagram, SchemaEnum, SchemaIndex, SchemaRelationship, SchemaTable,
    render_mermaid_er_diagram,
};
pub use self::migration_reset::{
    MigrationResetError, MigrationStateResetService, QualifiedTable, ResetOutcome,
};
pub use self::migration_service::{MigrationStatus, SchemaMigrationService};
pub use self::permissions::{
    DatabaseIdentity, GrantOutcome, GrantResult, PermissionRepairReport, PermissionRepairService,
    grant_statements,
};
pub use self::revision::{
    INITIAL_REVISION, MigrationRegistryError, MigrationUnit, Revision, RevisionChain,
    RevisionChainError, registered_migrations,
};
pub use self::schema_audit::{
    SchemaAuditReport, SchemaAuditService, SchemaFinding, SchemaState, audit_schema,
};
