//! Compares a live schema snapshot with the schema descriptor.
//!
//! The audit covers every object the descriptor creates: enumerations,
//! tables with their columns and keys, foreign keys, and indexes (unique
//! constraints are audited through their backing index). Objects outside
//! the descriptor, such as the migration version table, are ignored.

use std::fmt;

use serde::Serialize;

use crate::domain::er_diagram::{SchemaDiagram, SchemaTable};
use crate::domain::ports::{SchemaSnapshotRepository, SchemaSnapshotRepositoryError};
use crate::domain::schema::SchemaDefinition;

/// Overall verdict of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaState {
    /// No defined object exists.
    Absent,
    /// Every defined object exists and matches.
    Complete,
    /// Some objects exist, or existing objects differ from the descriptor.
    Partial,
}

impl fmt::Display for SchemaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "absent",
            Self::Complete => "complete",
            Self::Partial => "partial",
        })
    }
}

/// One difference between the descriptor and the live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaFinding {
    MissingEnum {
        name: String,
    },
    EnumLabelsDiffer {
        name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    MissingTable {
        table: String,
    },
    MissingColumn {
        table: String,
        column: String,
    },
    ColumnTypeDiffers {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    ColumnNullabilityDiffers {
        table: String,
        column: String,
        expected_nullable: bool,
    },
    PrimaryKeyDiffers {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    MissingRelationship {
        table: String,
        column: String,
        referenced_table: String,
        referenced_column: String,
    },
    MissingIndex {
        table: String,
        name: String,
    },
    IndexDiffers {
        name: String,
        expected_columns: Vec<String>,
        actual_columns: Vec<String>,
        expected_unique: bool,
    },
}

impl fmt::Display for SchemaFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnum { name } => write!(f, "enumeration {name} is missing"),
            Self::EnumLabelsDiffer {
                name,
                expected,
                actual,
            } => write!(
                f,
                "enumeration {name} has labels [{}], expected [{}]",
                actual.join(", "),
                expected.join(", ")
            ),
            Self::MissingTable { table } => write!(f, "table {table} is missing"),
            Self::MissingColumn { table, column } => {
                write!(f, "column {table}.{column} is missing")
            }
            Self::ColumnTypeDiffers {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "column {table}.{column} has type {actual}, expected {expected}"
            ),
            Self::ColumnNullabilityDiffers {
                table,
                column,
                expected_nullable,
            } => {
                let expected = if *expected_nullable { "NULL" } else { "NOT NULL" };
                write!(f, "column {table}.{column} should be {expected}")
            }
            Self::PrimaryKeyDiffers {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table {table} has primary key ({}), expected ({})",
                actual.join(", "),
                expected.join(", ")
            ),
            Self::MissingRelationship {
                table,
                column,
                referenced_table,
                referenced_column,
            } => write!(
                f,
                "foreign key {table}.{column} -> {referenced_table}.{referenced_column} is missing"
            ),
            Self::MissingIndex { table, name } => write!(f, "index {name} on {table} is missing"),
            Self::IndexDiffers {
                name,
                expected_columns,
                actual_columns,
                expected_unique,
            } => write!(
                f,
                "index {name} covers ({}), expected {}({})",
                actual_columns.join(", "),
                if *expected_unique { "unique " } else { "" },
                expected_columns.join(", ")
            ),
        }
    }
}

/// Result of auditing one live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaAuditReport {
    pub state: SchemaState,
    /// Defined objects (enumerations, tables, indexes) found by name.
    pub present_objects: usize,
    pub expected_objects: usize,
    pub findings: Vec<SchemaFinding>,
}

impl SchemaAuditReport {
    /// Audit `snapshot` against `definition`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::er_diagram::SchemaDiagram;
    /// use recruit_db::domain::schema::initial_schema;
    /// use recruit_db::domain::{SchemaAuditReport, SchemaState};
    ///
    /// let schema = initial_schema();
    /// let empty = SchemaAuditReport::evaluate(&schema, &SchemaDiagram::default());
    /// assert_eq!(empty.state, SchemaState::Absent);
    ///
    /// let migrated = SchemaDiagram::from_definition(&schema);
    /// let report = SchemaAuditReport::evaluate(&schema, &migrated);
    /// assert_eq!(report.state, SchemaState::Complete);
    /// ```
    pub fn evaluate(definition: &SchemaDefinition, snapshot: &SchemaDiagram) -> Self {
        let expected = SchemaDiagram::from_definition(definition);
        let mut findings = Vec::new();
        let mut present_objects = 0;

        for enumeration in &expected.enums {
            let Some(actual) = snapshot.enumeration(&enumeration.name) else {
                findings.push(SchemaFinding::MissingEnum {
                    name: enumeration.name.clone(),
                });
                continue;
            };
            present_objects += 1;
            if actual.labels != enumeration.labels {
                findings.push(SchemaFinding::EnumLabelsDiffer {
                    name: enumeration.name.clone(),
                    expected: enumeration.labels.clone(),
                    actual: actual.labels.clone(),
                });
            }
        }

        for table in &expected.tables {
            let Some(actual) = snapshot.table(&table.name) else {
                findings.push(SchemaFinding::MissingTable {
                    table: table.name.clone(),
                });
                continue;
            };
            present_objects += 1;
            audit_columns(table, actual, &mut findings);
        }

        for relationship in &expected.relationships {
            if snapshot.table(&relationship.referencing_table).is_none() {
                continue;
            }
            let exists = snapshot.relationships.iter().any(|candidate| {
                candidate.referencing_table == relationship.referencing_table
                    && candidate.referencing_column == relationship.referencing_column
                    && candidate.referenced_table == relationship.referenced_table
                    && candidate.referenced_column == relationship.referenced_column
            });
            if !exists {
                findings.push(SchemaFinding::MissingRelationship {
                    table: relationship.referencing_table.clone(),
                    column: relationship.referencing_column.clone(),
                    referenced_table: relationship.referenced_table.clone(),
                    referenced_column: relationship.referenced_column.clone(),
                });
            }
        }

        for index in &expected.indexes {
            let Some(actual) = snapshot
                .indexes
                .iter()
                .find(|candidate| candidate.name == index.name && candidate.table == index.table)
            else {
                findings.push(SchemaFinding::MissingIndex {
                    table: index.table.clone(),
                    name: index.name.clone(),
                });
                continue;
            };
            present_objects += 1;
            if actual.columns != index.columns || actual.is_unique != index.is_unique {
                findings.push(SchemaFinding::IndexDiffers {
                    name: index.name.clone(),
                    expected_columns: index.columns.clone(),
                    actual_columns: actual.columns.clone(),
                    expected_unique: index.is_unique,
                });
            }
        }

        let expected_objects = expected.enums.len() + expected.tables.len() + expected.indexes.len();
        let state = if present_objects == 0 {
            SchemaState::Absent
        } else if findings.is_empty() {
            SchemaState::Complete
        } else {
            SchemaState::Partial
        };

        Self {
            state,
            present_objects,
            expected_objects,
            findings,
        }
    }
}

fn audit_columns(expected: &SchemaTable, actual: &SchemaTable, findings: &mut Vec<SchemaFinding>) {
    for column in &expected.columns {
        let Some(live) = actual.column(&column.name) else {
            findings.push(SchemaFinding::MissingColumn {
                table: expected.name.clone(),
                column: column.name.clone(),
            });
            continue;
        };
        if live.data_type != column.data_type {
            findings.push(SchemaFinding::ColumnTypeDiffers {
                table: expected.name.clone(),
                column: column.name.clone(),
                expected: column.data_type.clone(),
                actual: live.data_type.clone(),
            });
        }
        if live.is_nullable != column.is_nullable {
            findings.push(SchemaFinding::ColumnNullabilityDiffers {
                table: expected.name.clone(),
                column: column.name.clone(),
                expected_nullable: column.is_nullable,
            });
        }
    }

    let key_of = |table: &SchemaTable| -> Vec<String> {
        table
            .columns
            .iter()
            .filter(|column| column.is_primary_key)
            .map(|column| column.name.clone())
            .collect()
    };
    let mut expected_key = key_of(expected);
    let mut actual_key = key_of(actual);
    expected_key.sort();
    actual_key.sort();
    if expected_key != actual_key {
        findings.push(SchemaFinding::PrimaryKeyDiffers {
            table: expected.name.clone(),
            expected: expected_key,
            actual: actual_key,
        });
    }
}

/// Loads live snapshots and audits them against one descriptor.
#[derive(Debug, Clone)]
pub struct SchemaAuditService {
    definition: SchemaDefinition,
}

impl SchemaAuditService {
    pub fn new(definition: SchemaDefinition) -> Self {
        Self { definition }
    }

    pub fn audit(
        &self,
        repository: &dyn SchemaSnapshotRepository,
    ) -> Result<SchemaAuditReport, SchemaSnapshotRepositoryError> {
        audit_schema(repository, &self.definition)
    }
}

/// Load a snapshot from `repository` and audit it.
///
/// # Examples
///
/// ```rust
/// use recruit_db::domain::audit_schema;
/// use recruit_db::domain::ports::FixtureSchemaSnapshotRepository;
/// use recruit_db::domain::schema::initial_schema;
///
/// let report = audit_schema(&FixtureSchemaSnapshotRepository::default(), &initial_schema())
///     .expect("fixture snapshot should load");
/// assert!(!report.findings.is_empty());
/// ```
pub fn audit_schema(
    repository: &dyn SchemaSnapshotRepository,
    definition: &SchemaDefinition,
) -> Result<SchemaAuditReport, SchemaSnapshotRepositoryError> {
    let snapshot = repository.load_schema_diagram()?;
    Ok(SchemaAuditReport::evaluate(definition, &snapshot))
}

#[cfg(test)]
#[path = "schema_audit_tests.rs"]
mod tests;
