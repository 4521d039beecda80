//! Forward and reverse DDL rendering for a [`SchemaDefinition`].
//!
//! Forward statements use plain `CREATE` so an existing object surfaces as a
//! duplicate-object error. Reverse statements walk the same objects in the
//! opposite order with `IF EXISTS`, so a partially applied schema can always
//! be unwound.

use std::fmt::Write as _;

use super::{Column, EnumType, Index, SchemaDefinition, Table};

/// PostgreSQL reserved key words that cannot appear as bare identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "table", "then", "to",
    "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
];

/// The database object a statement creates or drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    Enum(&'static str),
    Table(&'static str),
    Index(&'static str),
}

/// One rendered statement together with the object it affects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatement {
    pub object: SchemaObject,
    pub sql: String,
}

/// Quote an identifier only when PostgreSQL would not accept it bare.
///
/// # Examples
///
/// ```rust
/// use recruit_db::domain::schema::ddl::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), "users");
/// assert_eq!(quote_identifier("user"), "\"user\"");
/// assert_eq!(quote_identifier("App\"Role"), "\"App\"\"Role\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let mut characters = identifier.chars();
    let starts_well = characters
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first == '_');
    let is_plain = starts_well
        && characters.all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });

    if is_plain && !RESERVED_WORDS.contains(&identifier) {
        identifier.to_owned()
    } else {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

/// Render a string literal with embedded quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Statements creating every object, in dependency order.
pub fn upgrade_statements(definition: &SchemaDefinition) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();
    for enumeration in &definition.enums {
        statements.push(SchemaStatement {
            object: SchemaObject::Enum(enumeration.name),
            sql: create_enum(enumeration),
        });
    }
    for table in &definition.tables {
        statements.push(SchemaStatement {
            object: SchemaObject::Table(table.name),
            sql: create_table(table),
        });
        for index in &table.indexes {
            statements.push(SchemaStatement {
                object: SchemaObject::Index(index.name),
                sql: create_index(table, index),
            });
        }
    }
    statements
}

/// Statements dropping every object, in strict reverse of [`upgrade_statements`].
pub fn downgrade_statements(definition: &SchemaDefinition) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();
    for table in definition.tables.iter().rev() {
        for index in table.indexes.iter().rev() {
            statements.push(SchemaStatement {
                object: SchemaObject::Index(index.name),
                sql: format!("DROP INDEX IF EXISTS {}", quote_identifier(index.name)),
            });
        }
        statements.push(SchemaStatement {
            object: SchemaObject::Table(table.name),
            sql: format!("DROP TABLE IF EXISTS {}", quote_identifier(table.name)),
        });
    }
    for enumeration in definition.enums.iter().rev() {
        statements.push(SchemaStatement {
            object: SchemaObject::Enum(enumeration.name),
            sql: format!("DROP TYPE IF EXISTS {}", quote_identifier(enumeration.name)),
        });
    }
    statements
}

/// Join statements into a script executable as one batch.
pub fn render_script(statements: &[SchemaStatement]) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(&statement.sql);
        script.push_str(";\n");
    }
    script
}

fn create_enum(enumeration: &EnumType) -> String {
    let labels = enumeration
        .labels
        .iter()
        .map(|label| quote_literal(label))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TYPE {} AS ENUM ({labels})",
        quote_identifier(enumeration.name)
    )
}

fn create_table(table: &Table) -> String {
    let mut elements: Vec<String> = table.columns.iter().map(column_definition).collect();
    elements.push(format!("PRIMARY KEY ({})", column_list(&table.primary_key)));
    for foreign_key in &table.foreign_keys {
        elements.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            column_list(&foreign_key.columns),
            quote_identifier(foreign_key.referenced_table),
            column_list(&foreign_key.referenced_columns),
        ));
    }
    for unique in &table.unique_constraints {
        elements.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quote_identifier(unique.name),
            column_list(&unique.columns),
        ));
    }

    let mut sql = format!("CREATE TABLE {} (\n", quote_identifier(table.name));
    let body = elements
        .iter()
        .map(|element| format!("    {element}"))
        .collect::<Vec<_>>()
        .join(",\n");
    sql.push_str(&body);
    sql.push_str("\n)");
    sql
}

fn column_definition(column: &Column) -> String {
    let mut definition = format!(
        "{} {}",
        quote_identifier(column.name),
        column.column_type.ddl()
    );
    if !column.is_nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(expression) = column.server_default {
        let _ = write!(definition, " DEFAULT {expression}");
    }
    definition
}

fn create_index(table: &Table, index: &Index) -> String {
    let kind = if index.is_unique {
        "UNIQUE INDEX"
    } else {
        "INDEX"
    };
    format!(
        "CREATE {kind} {} ON {} ({})",
        quote_identifier(index.name),
        quote_identifier(table.name),
        column_list(&index.columns),
    )
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ")
}
