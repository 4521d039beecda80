//! Unit tests for atomic ER diagram writes.

use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::domain::er_diagram::{SchemaColumn, SchemaDiagram, SchemaTable};
use crate::domain::ports::{
    FixtureSchemaSnapshotRepository, MockSchemaSnapshotRepository, SchemaSnapshotRepositoryError,
};
use crate::domain::schema::initial_schema;
use crate::er_snapshots::{
    MERMAID_FILENAME, SnapshotGenerationError, SnapshotRequest, generate_from_definition,
    generate_from_repository,
};

#[fixture]
fn output() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn request_for(dir: &TempDir) -> SnapshotRequest {
    SnapshotRequest {
        output_dir: dir.path().join("diagrams"),
    }
}

fn staging_leftovers(dir: &TempDir) -> Vec<String> {
    fs::read_dir(dir.path().join("diagrams"))
        .expect("read output dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".tmp-er-diagram-"))
        .collect()
}

#[rstest]
fn descriptor_diagram_is_written_with_header(output: TempDir) {
    let request = request_for(&output);
    let artifacts =
        generate_from_definition(&initial_schema(), &request).expect("diagram should be written");

    assert_eq!(artifacts.mermaid_path, request.output_dir.join(MERMAID_FILENAME));
    let contents = fs::read_to_string(&artifacts.mermaid_path).expect("read diagram");
    assert!(contents.starts_with("%% Generated from the schema descriptor."));
    assert!(contents.contains("erDiagram\n"));
    assert!(contents.contains("  %% enum teststatus: "));
    assert!(staging_leftovers(&output).is_empty());
}

#[rstest]
fn existing_diagram_is_replaced(output: TempDir) {
    let request = request_for(&output);
    fs::create_dir_all(&request.output_dir).expect("create output dir");
    fs::write(request.output_dir.join(MERMAID_FILENAME), "stale").expect("seed stale file");

    let diagram = SchemaDiagram {
        tables: vec![SchemaTable {
            name: "logs".to_owned(),
            columns: vec![SchemaColumn {
                name: "log_id".to_owned(),
                data_type: "integer".to_owned(),
                is_primary_key: true,
                is_nullable: false,
                comment: None,
            }],
        }],
        ..SchemaDiagram::default()
    };
    let artifacts =
        generate_from_repository(&FixtureSchemaSnapshotRepository::new(diagram), &request)
            .expect("diagram should be written");

    let contents = fs::read_to_string(&artifacts.mermaid_path).expect("read diagram");
    assert!(contents.starts_with("%% Generated from a live database."));
    assert!(contents.contains("    integer log_id PK\n"));
    assert!(!contents.contains("stale"));
}

#[rstest]
fn repository_failure_leaves_no_file(output: TempDir) {
    let request = request_for(&output);
    let mut repository = MockSchemaSnapshotRepository::new();
    repository
        .expect_load_schema_diagram()
        .return_once(|| Err(SchemaSnapshotRepositoryError::query("relation missing")));

    let error = generate_from_repository(&repository, &request).expect_err("should fail");
    assert!(matches!(error, SnapshotGenerationError::Repository(_)));
    assert!(!request.output_dir.join(MERMAID_FILENAME).exists());
}

#[rstest]
fn output_path_blocked_by_a_file_is_an_io_error(output: TempDir) {
    let blocker = output.path().join("diagrams");
    fs::write(&blocker, "not a directory").expect("create blocking file");

    let error = generate_from_definition(&initial_schema(), &request_for(&output))
        .expect_err("a file cannot be used as the output directory");
    assert!(matches!(error, SnapshotGenerationError::Io { path, .. } if path == blocker));
}
