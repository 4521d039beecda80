//! Mermaid ER diagram files written atomically.
//!
//! The diagram is staged in a uniquely named sibling directory and renamed
//! over the final path, so readers never observe a half-written file.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::er_diagram::SchemaDiagram;
use crate::domain::ports::{SchemaSnapshotRepository, SchemaSnapshotRepositoryError};
use crate::domain::render_mermaid_er_diagram;
use crate::domain::schema::SchemaDefinition;

pub const MERMAID_FILENAME: &str = "schema.mmd";
const DESCRIPTOR_HEADER: &str = "%% Generated from the schema descriptor. Do not edit manually.\n";
const DATABASE_HEADER: &str = "%% Generated from a live database. Do not edit manually.\n";

#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub output_dir: PathBuf,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docs/diagrams/er"),
        }
    }
}

/// Paths written by one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifacts {
    pub mermaid_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum SnapshotGenerationError {
    #[error(transparent)]
    Repository(#[from] SchemaSnapshotRepositoryError),
    #[error("filesystem operation failed ({path}): {message}")]
    Io { path: PathBuf, message: String },
}

impl SnapshotGenerationError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Write the diagram of the schema a descriptor creates.
///
/// # Examples
///
/// ```rust,no_run
/// use recruit_db::domain::schema::initial_schema;
/// use recruit_db::er_snapshots::{SnapshotRequest, generate_from_definition};
///
/// let artifacts = generate_from_definition(&initial_schema(), &SnapshotRequest::default())?;
/// assert!(artifacts.mermaid_path.ends_with("schema.mmd"));
/// # Ok::<(), recruit_db::er_snapshots::SnapshotGenerationError>(())
/// ```
pub fn generate_from_definition(
    definition: &SchemaDefinition,
    request: &SnapshotRequest,
) -> Result<SnapshotArtifacts, SnapshotGenerationError> {
    let diagram = SchemaDiagram::from_definition(definition);
    write_diagram(DESCRIPTOR_HEADER, &diagram, request)
}

/// Write the diagram of whatever `repository` introspects.
pub fn generate_from_repository(
    repository: &dyn SchemaSnapshotRepository,
    request: &SnapshotRequest,
) -> Result<SnapshotArtifacts, SnapshotGenerationError> {
    let diagram = repository.load_schema_diagram()?;
    write_diagram(DATABASE_HEADER, &diagram, request)
}

fn write_diagram(
    header: &str,
    diagram: &SchemaDiagram,
    request: &SnapshotRequest,
) -> Result<SnapshotArtifacts, SnapshotGenerationError> {
    let mermaid = format!("{header}{}", render_mermaid_er_diagram(diagram));
    let artifacts = write_atomically(mermaid.as_str(), request)?;
    info!(path = %artifacts.mermaid_path.display(), "wrote ER diagram");
    Ok(artifacts)
}

fn write_atomically(
    mermaid: &str,
    request: &SnapshotRequest,
) -> Result<SnapshotArtifacts, SnapshotGenerationError> {
    Dir::create_ambient_dir_all(&request.output_dir, ambient_authority())
        .map_err(|error| SnapshotGenerationError::io(&request.output_dir, error))?;
    let output_dir = Dir::open_ambient_dir(&request.output_dir, ambient_authority())
        .map_err(|error| SnapshotGenerationError::io(&request.output_dir, error))?;

    let staging_dir_name = format!(".tmp-er-diagram-{}", Uuid::new_v4().simple());
    output_dir.create_dir(&staging_dir_name).map_err(|error| {
        SnapshotGenerationError::io(request.output_dir.join(&staging_dir_name), error)
    })?;

    let staged_relative = PathBuf::from(&staging_dir_name).join(MERMAID_FILENAME);
    let final_path = request.output_dir.join(MERMAID_FILENAME);

    let result = output_dir
        .write(&staged_relative, mermaid.as_bytes())
        .map_err(|error| {
            SnapshotGenerationError::io(request.output_dir.join(&staged_relative), error)
        })
        .and_then(|()| {
            replace_file(
                &output_dir,
                staged_relative.as_path(),
                Path::new(MERMAID_FILENAME),
                &request.output_dir,
            )
        })
        .map(|()| SnapshotArtifacts {
            mermaid_path: final_path,
        });

    let _cleanup_result = output_dir.remove_dir_all(&staging_dir_name);
    result
}

fn replace_file(
    directory: &Dir,
    from: &Path,
    to: &Path,
    output_dir: &Path,
) -> Result<(), SnapshotGenerationError> {
    match directory.remove_file(to) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(SnapshotGenerationError::io(output_dir.join(to), error)),
    }
    directory
        .rename(from, directory, to)
        .map_err(|error| SnapshotGenerationError::io(output_dir.join(to), error))
}

#[cfg(test)]
#[path = "er_snapshots_tests.rs"]
mod tests;
