//! Structural contracts of the registered migrations, checked without a
//! database.

use recruit_db::domain::schema::ddl::{SchemaObject, downgrade_statements, upgrade_statements};
use recruit_db::domain::schema::{
    Column, ColumnType, ForeignKey, SchemaDefinition, SchemaDefinitionError, Table, initial_schema,
};
use recruit_db::domain::{INITIAL_REVISION, MigrationStatus, registered_migrations};
use recruit_db::outbound::persistence::ChainMigrationSource;
use rstest::rstest;

#[rstest]
fn downgrade_drops_objects_in_exact_reverse_order() {
    let schema = initial_schema();
    let created: Vec<SchemaObject> = upgrade_statements(&schema)
        .into_iter()
        .map(|statement| statement.object)
        .collect();
    let mut dropped: Vec<SchemaObject> = downgrade_statements(&schema)
        .into_iter()
        .map(|statement| statement.object)
        .collect();
    dropped.reverse();

    assert_eq!(created, dropped);
}

#[rstest]
fn upgrade_uses_plain_create_and_downgrade_tolerates_absence() {
    let schema = initial_schema();
    assert!(
        upgrade_statements(&schema)
            .iter()
            .all(|statement| statement.sql.starts_with("CREATE ")
                && !statement.sql.contains("IF NOT EXISTS"))
    );
    assert!(
        downgrade_statements(&schema)
            .iter()
            .all(|statement| statement.sql.contains(" IF EXISTS "))
    );
}

#[rstest]
fn enumerations_are_created_first_and_dropped_last() {
    let schema = initial_schema();
    let upgrade = upgrade_statements(&schema);
    let downgrade = downgrade_statements(&schema);

    assert!(matches!(
        upgrade.as_slice(),
        [first, second, ..]
            if first.object == SchemaObject::Enum("userrole")
                && second.object == SchemaObject::Enum("teststatus")
    ));
    assert!(matches!(
        downgrade.as_slice(),
        [.., penultimate, last]
            if penultimate.object == SchemaObject::Enum("teststatus")
                && last.object == SchemaObject::Enum("userrole")
    ));
}

#[rstest]
fn descriptor_rejects_references_to_later_tables() {
    let schema = SchemaDefinition {
        enums: Vec::new(),
        tables: vec![
            Table::new("applications")
                .column(Column::required("application_id", ColumnType::Serial))
                .column(Column::required("test_id", ColumnType::Integer))
                .primary_key(&["application_id"])
                .foreign_key(ForeignKey::new(&["test_id"], "tests", &["test_id"])),
            Table::new("tests")
                .column(Column::required("test_id", ColumnType::Serial))
                .primary_key(&["test_id"]),
        ],
    };

    assert_eq!(
        schema.validate(),
        Err(SchemaDefinitionError::ForwardReference {
            table: "applications",
            referenced_table: "tests",
        })
    );
}

#[rstest]
fn registry_exposes_the_initial_revision_as_head() {
    let chain = registered_migrations().expect("registered migrations should be valid");

    assert_eq!(chain.head(), Some(&INITIAL_REVISION));
    assert_eq!(INITIAL_REVISION.down_revision, None);
    assert_eq!(
        ChainMigrationSource::from_chain(&chain).versions(),
        vec![INITIAL_REVISION.id]
    );
}

#[rstest]
fn fresh_database_has_every_revision_pending() {
    let chain = registered_migrations().expect("registered migrations should be valid");
    let status = MigrationStatus::from_chain(&chain, &[]);

    assert!(status.applied.is_empty());
    assert_eq!(status.pending, vec![INITIAL_REVISION.id]);
    assert!(!status.is_up_to_date());
}
