//! Port for reading the live schema of the target database.

use crate::domain::er_diagram::SchemaDiagram;

use super::define_port_error;

define_port_error! {
    /// Errors raised while introspecting a live schema.
    pub enum SchemaSnapshotRepositoryError {
        /// Connection to the database failed.
        Connection { message: String } =>
            "schema snapshot connection failed: {message}",
        /// A catalogue query failed.
        Query { message: String } =>
            "schema snapshot query failed: {message}",
    }
}

/// Reads tables, columns, foreign keys, enumerations and indexes of one
/// schema.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaSnapshotRepository: Send + Sync {
    fn load_schema_diagram(&self) -> Result<SchemaDiagram, SchemaSnapshotRepositoryError>;
}

/// Fixture returning a fixed snapshot, empty by default.
#[derive(Debug, Clone, Default)]
pub struct FixtureSchemaSnapshotRepository {
    diagram: SchemaDiagram,
}

impl FixtureSchemaSnapshotRepository {
    pub fn new(diagram: SchemaDiagram) -> Self {
        Self { diagram }
    }
}

impl SchemaSnapshotRepository for FixtureSchemaSnapshotRepository {
    fn load_schema_diagram(&self) -> Result<SchemaDiagram, SchemaSnapshotRepositoryError> {
        Ok(self.diagram.clone())
    }
}
