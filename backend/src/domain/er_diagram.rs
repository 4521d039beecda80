//! Schema snapshots and their Mermaid entity-relationship rendering.
//!
//! A [`SchemaDiagram`] is produced either from the schema descriptor or by
//! introspecting a live database, so the same value feeds both the rendered
//! documentation and the schema audit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::domain::schema::{SchemaDefinition, Table};

/// A full schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiagram {
    pub enums: Vec<SchemaEnum>,
    pub tables: Vec<SchemaTable>,
    pub relationships: Vec<SchemaRelationship>,
    pub indexes: Vec<SchemaIndex>,
}

/// A PostgreSQL enum type with labels in sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaEnum {
    pub name: String,
    pub labels: Vec<String>,
}

/// A table with typed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaTable {
    pub name: String,
    pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// A typed column, spelled the way `pg_catalog.format_type` reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaColumn {
    pub name: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    /// Free-form note rendered next to the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One column pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRelationship {
    pub referencing_table: String,
    pub referencing_column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub referencing_is_nullable: bool,
}

/// A secondary index; unique constraints appear here under their own name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIndex {
    pub table: String,
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

impl SchemaDiagram {
    /// Describe the schema a descriptor creates, without touching a database.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::er_diagram::SchemaDiagram;
    /// use recruit_db::domain::schema::initial_schema;
    ///
    /// let diagram = SchemaDiagram::from_definition(&initial_schema());
    /// let users = diagram.table("users").expect("users table");
    /// assert_eq!(users.column("user_id").map(|c| c.data_type.as_str()), Some("integer"));
    /// ```
    pub fn from_definition(definition: &SchemaDefinition) -> Self {
        let enums = definition
            .enums
            .iter()
            .map(|enumeration| SchemaEnum {
                name: enumeration.name.to_owned(),
                labels: enumeration.labels.iter().map(|label| (*label).to_owned()).collect(),
            })
            .collect();

        let mut diagram = Self {
            enums,
            ..Self::default()
        };
        for table in &definition.tables {
            diagram.tables.push(describe_table(table));
            diagram.relationships.extend(describe_relationships(table));
            diagram.indexes.extend(describe_indexes(table));
        }
        diagram
    }

    pub fn table(&self, name: &str) -> Option<&SchemaTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&SchemaEnum> {
        self.enums.iter().find(|enumeration| enumeration.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&SchemaIndex> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// A copy with every collection in a stable order.
    ///
    /// Column order inside a table and label order inside an enumeration are
    /// meaningful and preserved.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.enums.sort_by(|left, right| left.name.cmp(&right.name));
        normalized.tables.sort_by(|left, right| left.name.cmp(&right.name));
        normalized.relationships.sort_by(|left, right| {
            relationship_key(left).cmp(&relationship_key(right))
        });
        normalized
            .indexes
            .sort_by(|left, right| (&left.table, &left.name).cmp(&(&right.table, &right.name)));
        normalized
    }
}

fn relationship_key(relationship: &SchemaRelationship) -> (&str, &str, &str, &str) {
    (
        relationship.referenced_table.as_str(),
        relationship.referencing_table.as_str(),
        relationship.referencing_column.as_str(),
        relationship.referenced_column.as_str(),
    )
}

fn describe_table(table: &Table) -> SchemaTable {
    let columns = table
        .columns
        .iter()
        .map(|column| SchemaColumn {
            name: column.name.to_owned(),
            data_type: column.column_type.catalog_name(),
            is_primary_key: table.primary_key.contains(&column.name),
            is_nullable: column.is_nullable && !table.primary_key.contains(&column.name),
            comment: column
                .application_default
                .map(|value| format!("default {value}")),
        })
        .collect();
    SchemaTable {
        name: table.name.to_owned(),
        columns,
    }
}

fn describe_relationships(table: &Table) -> Vec<SchemaRelationship> {
    let mut relationships = Vec::new();
    for foreign_key in &table.foreign_keys {
        for (column, referenced) in foreign_key
            .columns
            .iter()
            .zip(&foreign_key.referenced_columns)
        {
            let referencing_is_nullable = table
                .find_column(column)
                .is_some_and(|definition| definition.is_nullable);
            relationships.push(SchemaRelationship {
                referencing_table: table.name.to_owned(),
                referencing_column: (*column).to_owned(),
                referenced_table: foreign_key.referenced_table.to_owned(),
                referenced_column: (*referenced).to_owned(),
                referencing_is_nullable,
            });
        }
    }
    relationships
}

fn describe_indexes(table: &Table) -> Vec<SchemaIndex> {
    let indexes = table.indexes.iter().map(|index| SchemaIndex {
        table: table.name.to_owned(),
        name: index.name.to_owned(),
        columns: owned_names(&index.columns),
        is_unique: index.is_unique,
    });
    let constraints = table.unique_constraints.iter().map(|unique| SchemaIndex {
        table: table.name.to_owned(),
        name: unique.name.to_owned(),
        columns: owned_names(&unique.columns),
        is_unique: true,
    });
    indexes.chain(constraints).collect()
}

fn owned_names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| (*column).to_owned()).collect()
}

/// Render a Mermaid ER diagram.
///
/// Enumerations become leading comment lines; relationships use `||--o{`
/// when the referencing column is nullable and `||--|{` otherwise.
///
/// # Examples
///
/// ```rust
/// use recruit_db::domain::er_diagram::{SchemaDiagram, render_mermaid_er_diagram};
/// use recruit_db::domain::schema::initial_schema;
///
/// let rendered = render_mermaid_er_diagram(&SchemaDiagram::from_definition(&initial_schema()));
/// assert!(rendered.contains("Users ||--|{ CandidateApplications : \"user_id -> user_id\""));
/// ```
pub fn render_mermaid_er_diagram(diagram: &SchemaDiagram) -> String {
    let normalized = diagram.normalized();
    let mut output = String::from("erDiagram\n");

    for enumeration in &normalized.enums {
        let _ = writeln!(
            output,
            "  %% enum {}: {}",
            enumeration.name,
            enumeration.labels.join(", ")
        );
    }
    if !normalized.enums.is_empty() {
        output.push('\n');
    }

    for table in &normalized.tables {
        let foreign_keys: BTreeSet<&str> = normalized
            .relationships
            .iter()
            .filter(|relationship| relationship.referencing_table == table.name)
            .map(|relationship| relationship.referencing_column.as_str())
            .collect();
        let unique: BTreeSet<&str> = normalized
            .indexes
            .iter()
            .filter(|index| index.table == table.name && index.is_unique)
            .filter_map(|index| match index.columns.as_slice() {
                [only] => Some(only.as_str()),
                _ => None,
            })
            .collect();

        let _ = writeln!(output, "  {} {{", entity_name(&table.name));
        for column in &table.columns {
            let mut keys = Vec::new();
            if column.is_primary_key {
                keys.push("PK");
            }
            if foreign_keys.contains(column.name.as_str()) {
                keys.push("FK");
            }
            if unique.contains(column.name.as_str()) {
                keys.push("UK");
            }

            let _ = write!(
                output,
                "    {} {}",
                sanitize_data_type(&column.data_type),
                column.name
            );
            if !keys.is_empty() {
                let _ = write!(output, " {}", keys.join(", "));
            }
            if let Some(comment) = &column.comment {
                let _ = write!(output, " \"{}\"", comment.replace('"', "'"));
            }
            output.push('\n');
        }
        output.push_str("  }\n\n");
    }

    let entities: BTreeMap<&str, String> = normalized
        .tables
        .iter()
        .map(|table| (table.name.as_str(), entity_name(&table.name)))
        .collect();
    let lookup = |table: &str| {
        entities
            .get(table)
            .cloned()
            .unwrap_or_else(|| entity_name(table))
    };
    for relationship in &normalized.relationships {
        let cardinality = if relationship.referencing_is_nullable {
            "||--o{"
        } else {
            "||--|{"
        };
        let _ = writeln!(
            output,
            "  {} {cardinality} {} : \"{} -> {}\"",
            lookup(&relationship.referenced_table),
            lookup(&relationship.referencing_table),
            relationship.referencing_column,
            relationship.referenced_column,
        );
    }

    output
}

/// `candidate_applications` becomes `CandidateApplications`.
fn entity_name(table: &str) -> String {
    let name: String = table
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut characters = segment.chars();
            characters.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(characters).collect()
            })
        })
        .collect();
    if name.is_empty() {
        table.to_owned()
    } else {
        name
    }
}

/// Mermaid attribute types must be single words.
fn sanitize_data_type(data_type: &str) -> String {
    let mut sanitized = String::with_capacity(data_type.len());
    for character in data_type.replace("[]", " array").chars() {
        if character.is_ascii_alphanumeric() {
            sanitized.push(character.to_ascii_lowercase());
        } else if !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "unknown".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    //! Descriptor conversion and deterministic Mermaid rendering.

    use rstest::rstest;

    use super::*;
    use crate::domain::schema::initial_schema;

    fn column(name: &str, data_type: &str, is_primary_key: bool, is_nullable: bool) -> SchemaColumn {
        SchemaColumn {
            name: name.to_owned(),
            data_type: data_type.to_owned(),
            is_primary_key,
            is_nullable,
            comment: None,
        }
    }

    #[rstest]
    fn renders_tables_in_name_order_with_key_markers() {
        let diagram = SchemaDiagram {
            tables: vec![
                SchemaTable {
                    name: "revoked_tokens".to_owned(),
                    columns: vec![
                        column("id", "integer", true, false),
                        column("jti", "character varying", false, false),
                    ],
                },
                SchemaTable {
                    name: "logs".to_owned(),
                    columns: vec![column("id", "integer", true, false)],
                },
            ],
            indexes: vec![SchemaIndex {
                table: "revoked_tokens".to_owned(),
                name: "ix_revoked_tokens_jti".to_owned(),
                columns: vec!["jti".to_owned()],
                is_unique: true,
            }],
            ..SchemaDiagram::default()
        };

        let expected = concat!(
            "erDiagram\n",
            "  Logs {\n",
            "    integer id PK\n",
            "  }\n\n",
            "  RevokedTokens {\n",
            "    integer id PK\n",
            "    character_varying jti UK\n",
            "  }\n\n",
        );
        assert_eq!(render_mermaid_er_diagram(&diagram), expected);
    }

    #[rstest]
    fn nullable_foreign_keys_use_optional_cardinality() {
        let rendered = render_mermaid_er_diagram(&SchemaDiagram::from_definition(&initial_schema()));
        assert!(rendered.contains("  Users ||--o{ Tests : \"updated_by -> user_id\"\n"));
        assert!(rendered.contains("  Users ||--|{ Tests : \"created_by -> user_id\"\n"));
        assert!(rendered.contains("    integer created_by FK\n"));
    }

    #[rstest]
    fn enumerations_and_application_defaults_are_annotated() {
        let rendered = render_mermaid_er_diagram(&SchemaDiagram::from_definition(&initial_schema()));
        assert!(rendered.contains("  %% enum teststatus: preparing, draft, scheduled, live, ended\n"));
        assert!(rendered.contains("    teststatus status \"default draft\"\n"));
    }

    #[rstest]
    fn descriptor_snapshot_lists_unique_constraints_as_indexes() {
        let diagram = SchemaDiagram::from_definition(&initial_schema());
        let constraint = diagram
            .index("unique_user_test_application")
            .expect("constraint should be described");
        assert!(constraint.is_unique);
        assert_eq!(constraint.columns, vec!["user_id", "test_id"]);
        assert_eq!(constraint.table, "candidate_applications");
    }

    #[rstest]
    #[case("character varying(100)", "character_varying_100")]
    #[case("timestamp with time zone", "timestamp_with_time_zone")]
    #[case("uuid[]", "uuid_array")]
    #[case("\"quoted\"", "quoted")]
    #[case("()", "unknown")]
    fn data_types_become_single_words(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_data_type(raw), expected);
    }
}
