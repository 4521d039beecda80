//! Declarative descriptors for the persisted relational structure.
//!
//! A [`SchemaDefinition`] lists enumerations and tables in dependency order.
//! Forward and reverse migration statements are rendered from the same value
//! (see [`ddl`]), and live databases are audited against it.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::enumerations::PersistedEnum;

pub mod ddl;
mod initial;

pub use initial::initial_schema;

/// Column types used by the schema, spelled the way the DDL renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing `integer` backed by an owned sequence.
    Serial,
    Integer,
    /// `VARCHAR`, optionally length limited.
    Varchar(Option<u32>),
    Text,
    Boolean,
    /// Double precision floating point.
    Float,
    /// `TIMESTAMP WITHOUT TIME ZONE`.
    Timestamp,
    /// `TIMESTAMP WITH TIME ZONE`.
    TimestampTz,
    Json,
    /// A declared enumeration, referenced by its type name.
    Enum(&'static str),
}

impl ColumnType {
    /// Spelling used in `CREATE TABLE`.
    pub fn ddl(self) -> String {
        match self {
            Self::Serial => "SERIAL".to_owned(),
            Self::Integer => "INTEGER".to_owned(),
            Self::Varchar(Some(length)) => format!("VARCHAR({length})"),
            Self::Varchar(None) => "VARCHAR".to_owned(),
            Self::Text => "TEXT".to_owned(),
            Self::Boolean => "BOOLEAN".to_owned(),
            Self::Float => "FLOAT".to_owned(),
            Self::Timestamp => "TIMESTAMP WITHOUT TIME ZONE".to_owned(),
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_owned(),
            Self::Json => "JSON".to_owned(),
            Self::Enum(name) => ddl::quote_identifier(name),
        }
    }

    /// Spelling reported by `pg_catalog.format_type` once the column exists.
    pub fn catalog_name(self) -> String {
        match self {
            Self::Serial | Self::Integer => "integer".to_owned(),
            Self::Varchar(Some(length)) => format!("character varying({length})"),
            Self::Varchar(None) => "character varying".to_owned(),
            Self::Text => "text".to_owned(),
            Self::Boolean => "boolean".to_owned(),
            Self::Float => "double precision".to_owned(),
            Self::Timestamp => "timestamp without time zone".to_owned(),
            Self::TimestampTz => "timestamp with time zone".to_owned(),
            Self::Json => "json".to_owned(),
            Self::Enum(name) => name.to_owned(),
        }
    }
}

/// A typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    /// SQL expression emitted as the column's `DEFAULT` clause.
    pub server_default: Option<&'static str>,
    /// Value writers are expected to supply when the field is omitted.
    ///
    /// Recorded for documentation only; never rendered into DDL.
    pub application_default: Option<&'static str>,
}

impl Column {
    /// A `NOT NULL` column.
    pub const fn required(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            is_nullable: false,
            server_default: None,
            application_default: None,
        }
    }

    /// A nullable column.
    pub const fn optional(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            is_nullable: true,
            server_default: None,
            application_default: None,
        }
    }

    #[must_use]
    pub const fn server_default(mut self, expression: &'static str) -> Self {
        self.server_default = Some(expression);
        self
    }

    #[must_use]
    pub const fn application_default(mut self, value: &'static str) -> Self {
        self.application_default = Some(value);
        self
    }
}

/// A foreign key from columns of the owning table to another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: Vec<&'static str>,
    pub referenced_table: &'static str,
    pub referenced_columns: Vec<&'static str>,
}

impl ForeignKey {
    pub fn new(
        columns: &[&'static str],
        referenced_table: &'static str,
        referenced_columns: &[&'static str],
    ) -> Self {
        Self {
            columns: columns.to_vec(),
            referenced_table,
            referenced_columns: referenced_columns.to_vec(),
        }
    }
}

/// A named table-level `UNIQUE` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
}

impl UniqueConstraint {
    pub fn new(name: &'static str, columns: &[&'static str]) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
        }
    }
}

/// A B-tree index created after its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub is_unique: bool,
}

impl Index {
    pub fn new(name: &'static str, columns: &[&'static str]) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
            is_unique: false,
        }
    }

    pub fn unique(name: &'static str, columns: &[&'static str]) -> Self {
        Self {
            is_unique: true,
            ..Self::new(name, columns)
        }
    }
}

/// A table with its columns and constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub primary_key: Vec<&'static str>,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub indexes: Vec<Index>,
}

impl Table {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn primary_key(mut self, columns: &[&'static str]) -> Self {
        self.primary_key = columns.to_vec();
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    #[must_use]
    pub fn unique(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Look up a column by name.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }
}

/// A PostgreSQL enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    pub labels: Vec<&'static str>,
}

impl EnumType {
    /// Describe the database type mirrored by a Rust enumeration.
    pub fn of<E: PersistedEnum>() -> Self {
        Self {
            name: E::SQL_TYPE,
            labels: E::labels(),
        }
    }
}

/// Violations detected by [`SchemaDefinition::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaDefinitionError {
    #[error("enumeration '{name}' is declared more than once")]
    DuplicateEnum { name: &'static str },
    #[error("enumeration '{name}' has no labels")]
    EmptyEnum { name: &'static str },
    #[error("table '{name}' is declared more than once")]
    DuplicateTable { name: &'static str },
    #[error("table '{table}' declares column '{column}' more than once")]
    DuplicateColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("relation name '{name}' is used by more than one index or constraint")]
    DuplicateRelationName { name: &'static str },
    #[error("table '{table}' has no primary key")]
    MissingPrimaryKey { table: &'static str },
    #[error("{context} on table '{table}' names unknown column '{column}'")]
    UnknownColumn {
        table: &'static str,
        column: &'static str,
        context: &'static str,
    },
    #[error("column '{table}.{column}' uses undeclared enumeration '{enum_name}'")]
    UnknownEnum {
        table: &'static str,
        column: &'static str,
        enum_name: &'static str,
    },
    #[error("table '{table}' references '{referenced_table}', which is not declared before it")]
    ForwardReference {
        table: &'static str,
        referenced_table: &'static str,
    },
    #[error("foreign key on '{table}' names unknown column '{referenced_table}.{column}'")]
    UnknownReferencedColumn {
        table: &'static str,
        referenced_table: &'static str,
        column: &'static str,
    },
    #[error("foreign key on '{table}' to '{referenced_table}' pairs columns of different arity")]
    ForeignKeyArity {
        table: &'static str,
        referenced_table: &'static str,
    },
}

/// Ordered enumerations and tables making up one schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDefinition {
    /// Created first, dropped last.
    pub enums: Vec<EnumType>,
    /// Parents precede children.
    pub tables: Vec<Table>,
}

impl SchemaDefinition {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Look up an enumeration by name.
    pub fn enumeration(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|enumeration| enumeration.name == name)
    }

    /// Check structural invariants, including dependency order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::schema::initial_schema;
    ///
    /// assert!(initial_schema().validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), SchemaDefinitionError> {
        let mut enum_names = HashSet::new();
        for enumeration in &self.enums {
            if !enum_names.insert(enumeration.name) {
                return Err(SchemaDefinitionError::DuplicateEnum {
                    name: enumeration.name,
                });
            }
            if enumeration.labels.is_empty() {
                return Err(SchemaDefinitionError::EmptyEnum {
                    name: enumeration.name,
                });
            }
        }

        let mut relation_names = HashSet::new();
        for (position, table) in self.tables.iter().enumerate() {
            let declared_before = self.tables.get(..position).unwrap_or_default();
            if declared_before.iter().any(|other| other.name == table.name) {
                return Err(SchemaDefinitionError::DuplicateTable { name: table.name });
            }
            validate_columns(table, &enum_names)?;
            validate_keys(table)?;
            validate_foreign_keys(table, declared_before)?;

            for name in table
                .indexes
                .iter()
                .map(|index| index.name)
                .chain(table.unique_constraints.iter().map(|unique| unique.name))
            {
                if !relation_names.insert(name) {
                    return Err(SchemaDefinitionError::DuplicateRelationName { name });
                }
            }
        }

        Ok(())
    }
}

fn validate_columns(
    table: &Table,
    enum_names: &HashSet<&'static str>,
) -> Result<(), SchemaDefinitionError> {
    let mut column_names = HashSet::new();
    for column in &table.columns {
        if !column_names.insert(column.name) {
            return Err(SchemaDefinitionError::DuplicateColumn {
                table: table.name,
                column: column.name,
            });
        }
        if let ColumnType::Enum(enum_name) = column.column_type {
            if !enum_names.contains(enum_name) {
                return Err(SchemaDefinitionError::UnknownEnum {
                    table: table.name,
                    column: column.name,
                    enum_name,
                });
            }
        }
    }
    Ok(())
}

fn validate_keys(table: &Table) -> Result<(), SchemaDefinitionError> {
    if table.primary_key.is_empty() {
        return Err(SchemaDefinitionError::MissingPrimaryKey { table: table.name });
    }

    let groups = std::iter::once(("primary key", table.primary_key.as_slice()))
        .chain(
            table
                .unique_constraints
                .iter()
                .map(|unique| ("unique constraint", unique.columns.as_slice())),
        )
        .chain(
            table
                .indexes
                .iter()
                .map(|index| ("index", index.columns.as_slice())),
        )
        .chain(
            table
                .foreign_keys
                .iter()
                .map(|foreign_key| ("foreign key", foreign_key.columns.as_slice())),
        );

    for (context, columns) in groups {
        if let Some(column) = columns.iter().copied().find(|column| !table.has_column(column)) {
            return Err(SchemaDefinitionError::UnknownColumn {
                table: table.name,
                column,
                context,
            });
        }
    }
    Ok(())
}

fn validate_foreign_keys(
    table: &Table,
    declared_before: &[Table],
) -> Result<(), SchemaDefinitionError> {
    for foreign_key in &table.foreign_keys {
        let referenced = if foreign_key.referenced_table == table.name {
            Some(table)
        } else {
            declared_before
                .iter()
                .find(|other| other.name == foreign_key.referenced_table)
        };
        let Some(referenced) = referenced else {
            return Err(SchemaDefinitionError::ForwardReference {
                table: table.name,
                referenced_table: foreign_key.referenced_table,
            });
        };
        if foreign_key.columns.len() != foreign_key.referenced_columns.len() {
            return Err(SchemaDefinitionError::ForeignKeyArity {
                table: table.name,
                referenced_table: referenced.name,
            });
        }
        if let Some(column) = foreign_key
            .referenced_columns
            .iter()
            .copied()
            .find(|column| !referenced.has_column(column))
        {
            return Err(SchemaDefinitionError::UnknownReferencedColumn {
                table: table.name,
                referenced_table: referenced.name,
                column,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Descriptor validation rules.

    use super::*;
    use rstest::rstest;

    fn keyed(name: &'static str) -> Table {
        Table::new(name)
            .column(Column::required("id", ColumnType::Serial))
            .primary_key(&["id"])
    }

    #[rstest]
    fn rejects_reference_to_table_declared_later() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![
                keyed("children")
                    .column(Column::required("parent_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new(&["parent_id"], "parents", &["id"])),
                keyed("parents"),
            ],
        };

        assert_eq!(
            definition.validate(),
            Err(SchemaDefinitionError::ForwardReference {
                table: "children",
                referenced_table: "parents",
            })
        );
    }

    #[rstest]
    fn accepts_self_reference() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![
                keyed("nodes")
                    .column(Column::optional("parent_id", ColumnType::Integer))
                    .foreign_key(ForeignKey::new(&["parent_id"], "nodes", &["id"])),
            ],
        };

        assert!(definition.validate().is_ok());
    }

    #[rstest]
    fn rejects_undeclared_enumeration() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![keyed("users").column(Column::required("role", ColumnType::Enum("userrole")))],
        };

        assert!(matches!(
            definition.validate(),
            Err(SchemaDefinitionError::UnknownEnum { enum_name: "userrole", .. })
        ));
    }

    #[rstest]
    fn rejects_index_on_missing_column() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![keyed("users").index(Index::unique("ix_users_email", &["email"]))],
        };

        assert_eq!(
            definition.validate(),
            Err(SchemaDefinitionError::UnknownColumn {
                table: "users",
                column: "email",
                context: "index",
            })
        );
    }

    #[rstest]
    fn rejects_reused_relation_names() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![
                keyed("a").index(Index::new("ix_shared", &["id"])),
                keyed("b").index(Index::new("ix_shared", &["id"])),
            ],
        };

        assert_eq!(
            definition.validate(),
            Err(SchemaDefinitionError::DuplicateRelationName { name: "ix_shared" })
        );
    }

    #[rstest]
    fn rejects_table_without_primary_key() {
        let definition = SchemaDefinition {
            enums: vec![],
            tables: vec![Table::new("loose").column(Column::optional("note", ColumnType::Text))],
        };

        assert_eq!(
            definition.validate(),
            Err(SchemaDefinitionError::MissingPrimaryKey { table: "loose" })
        );
    }

    #[rstest]
    fn rejects_duplicate_tables_and_columns() {
        let duplicate_table = SchemaDefinition {
            enums: vec![],
            tables: vec![keyed("users"), keyed("users")],
        };
        assert_eq!(
            duplicate_table.validate(),
            Err(SchemaDefinitionError::DuplicateTable { name: "users" })
        );

        let duplicate_column = SchemaDefinition {
            enums: vec![],
            tables: vec![keyed("users").column(Column::required("id", ColumnType::Integer))],
        };
        assert!(matches!(
            duplicate_column.validate(),
            Err(SchemaDefinitionError::DuplicateColumn { column: "id", .. })
        ));
    }

    #[rstest]
    #[case(ColumnType::Varchar(Some(100)), "VARCHAR(100)", "character varying(100)")]
    #[case(ColumnType::Varchar(None), "VARCHAR", "character varying")]
    #[case(ColumnType::Serial, "SERIAL", "integer")]
    #[case(ColumnType::Float, "FLOAT", "double precision")]
    #[case(ColumnType::TimestampTz, "TIMESTAMP WITH TIME ZONE", "timestamp with time zone")]
    #[case(ColumnType::Enum("teststatus"), "teststatus", "teststatus")]
    fn column_types_render_ddl_and_catalog_spellings(
        #[case] column_type: ColumnType,
        #[case] ddl: &str,
        #[case] catalog: &str,
    ) {
        assert_eq!(column_type.ddl(), ddl);
        assert_eq!(column_type.catalog_name(), catalog);
    }
}
