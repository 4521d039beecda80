//! Migration identity: revisions, migration units, and the revision chain.
//!
//! Each unit names its predecessor, forming a singly-linked chain from a
//! single root. The migration harness applies pending units ordered by
//! version string, so the chain additionally requires that walking it from
//! the root visits versions in strictly ascending order.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::schema::ddl::{
    SchemaStatement, downgrade_statements, render_script, upgrade_statements,
};
use crate::domain::schema::{SchemaDefinition, SchemaDefinitionError, initial_schema};

/// Identity and provenance of one migration unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: &'static str,
    /// `None` for the first revision.
    pub down_revision: Option<&'static str>,
    pub description: &'static str,
    pub created_at: &'static str,
}

/// A revision with the statements that apply and revert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub revision: Revision,
    pub upgrade: Vec<SchemaStatement>,
    pub downgrade: Vec<SchemaStatement>,
}

impl MigrationUnit {
    /// Build a unit whose forward and reverse statements both come from
    /// `definition`.
    pub fn from_schema(revision: Revision, definition: &SchemaDefinition) -> Self {
        Self {
            revision,
            upgrade: upgrade_statements(definition),
            downgrade: downgrade_statements(definition),
        }
    }

    pub fn upgrade_sql(&self) -> String {
        render_script(&self.upgrade)
    }

    pub fn downgrade_sql(&self) -> String {
        render_script(&self.downgrade)
    }
}

/// Violations detected while linking revisions into a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionChainError {
    #[error("revision id must not be empty")]
    EmptyRevisionId,
    #[error("revision '{id}' is registered more than once")]
    DuplicateRevision { id: &'static str },
    #[error("no root revision (one without a predecessor) is registered")]
    MissingRoot,
    #[error("more than one root revision is registered: {first}, {second}")]
    MultipleRoots {
        first: &'static str,
        second: &'static str,
    },
    #[error("revision '{id}' names unknown predecessor '{down_revision}'")]
    UnknownPredecessor {
        id: &'static str,
        down_revision: &'static str,
    },
    #[error("revision '{parent}' has more than one successor: {first}, {second}")]
    Fork {
        parent: &'static str,
        first: &'static str,
        second: &'static str,
    },
    #[error("revision '{id}' is not reachable from the root revision")]
    Unreachable { id: &'static str },
    #[error("revision '{id}' does not sort after its predecessor '{down_revision}'")]
    OutOfOrder {
        id: &'static str,
        down_revision: &'static str,
    },
}

/// Units ordered from the root revision to the head.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevisionChain {
    units: Vec<MigrationUnit>,
}

impl RevisionChain {
    /// Link units into a validated chain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recruit_db::domain::{MigrationUnit, Revision, RevisionChain};
    /// use recruit_db::domain::schema::SchemaDefinition;
    ///
    /// let root = MigrationUnit::from_schema(
    ///     Revision {
    ///         id: "001_root",
    ///         down_revision: None,
    ///         description: "root",
    ///         created_at: "2025-01-01 00:00:00",
    ///     },
    ///     &SchemaDefinition::default(),
    /// );
    /// let chain = RevisionChain::new(vec![root]).expect("single root is a valid chain");
    /// assert_eq!(chain.head().map(|revision| revision.id), Some("001_root"));
    /// ```
    pub fn new(units: Vec<MigrationUnit>) -> Result<Self, RevisionChainError> {
        if units.is_empty() {
            return Ok(Self::default());
        }

        let mut by_id: HashMap<&'static str, MigrationUnit> = HashMap::new();
        let mut successors: HashMap<&'static str, &'static str> = HashMap::new();
        let mut root: Option<&'static str> = None;

        for unit in &units {
            let revision = &unit.revision;
            if revision.id.trim().is_empty() {
                return Err(RevisionChainError::EmptyRevisionId);
            }
            if by_id.contains_key(revision.id) {
                return Err(RevisionChainError::DuplicateRevision { id: revision.id });
            }
            by_id.insert(revision.id, unit.clone());

            match revision.down_revision {
                None => {
                    if let Some(first) = root {
                        return Err(RevisionChainError::MultipleRoots {
                            first,
                            second: revision.id,
                        });
                    }
                    root = Some(revision.id);
                }
                Some(parent) => {
                    if let Some(first) = successors.insert(parent, revision.id) {
                        return Err(RevisionChainError::Fork {
                            parent,
                            first,
                            second: revision.id,
                        });
                    }
                }
            }
        }

        for unit in &units {
            if let Some(down_revision) = unit.revision.down_revision {
                if !by_id.contains_key(down_revision) {
                    return Err(RevisionChainError::UnknownPredecessor {
                        id: unit.revision.id,
                        down_revision,
                    });
                }
            }
        }

        let Some(root) = root else {
            return Err(RevisionChainError::MissingRoot);
        };

        let mut ordered = Vec::with_capacity(units.len());
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            let Some(unit) = by_id.remove(id) else {
                break;
            };
            if let Some(down_revision) = unit.revision.down_revision {
                if unit.revision.id <= down_revision {
                    return Err(RevisionChainError::OutOfOrder {
                        id: unit.revision.id,
                        down_revision,
                    });
                }
            }
            ordered.push(unit);
            cursor = successors.get(id).copied();
        }

        if let Some(unreachable) = units
            .iter()
            .map(|unit| unit.revision.id)
            .find(|id| by_id.contains_key(id))
        {
            return Err(RevisionChainError::Unreachable { id: unreachable });
        }

        Ok(Self { units: ordered })
    }

    /// Units from root to head.
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    /// The most recent revision, if any.
    pub fn head(&self) -> Option<&Revision> {
        self.units.last().map(|unit| &unit.revision)
    }

    /// Look up a unit by revision id.
    pub fn get(&self, id: &str) -> Option<&MigrationUnit> {
        self.units.iter().find(|unit| unit.revision.id == id)
    }
}

/// Failures raised while assembling the registered migrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationRegistryError {
    #[error("invalid schema definition: {0}")]
    Schema(#[from] SchemaDefinitionError),
    #[error("invalid revision chain: {0}")]
    Chain(#[from] RevisionChainError),
}

/// Revision creating the initial schema.
pub const INITIAL_REVISION: Revision = Revision {
    id: "001_initial_schema",
    down_revision: None,
    description: "Initial database schema with all tables",
    created_at: "2025-08-03 18:15:00",
};

/// Every migration unit shipped with this crate, as a validated chain.
pub fn registered_migrations() -> Result<RevisionChain, MigrationRegistryError> {
    let schema = initial_schema();
    schema.validate()?;
    let chain = RevisionChain::new(vec![MigrationUnit::from_schema(INITIAL_REVISION, &schema)])?;
    Ok(chain)
}

#[cfg(test)]
mod tests {
    //! Chain linking rules.

    use super::*;
    use rstest::rstest;

    fn unit(id: &'static str, down_revision: Option<&'static str>) -> MigrationUnit {
        MigrationUnit::from_schema(
            Revision {
                id,
                down_revision,
                description: "test revision",
                created_at: "2025-01-01 00:00:00",
            },
            &SchemaDefinition::default(),
        )
    }

    fn ids(chain: &RevisionChain) -> Vec<&'static str> {
        chain.units().iter().map(|unit| unit.revision.id).collect()
    }

    #[rstest]
    fn orders_units_from_root_regardless_of_registration_order() {
        let chain = RevisionChain::new(vec![
            unit("003_c", Some("002_b")),
            unit("001_a", None),
            unit("002_b", Some("001_a")),
        ])
        .expect("linear chain");
        assert_eq!(ids(&chain), vec!["001_a", "002_b", "003_c"]);
        assert_eq!(chain.head().map(|revision| revision.id), Some("003_c"));
    }

    #[rstest]
    fn empty_chain_has_no_head() {
        let chain = RevisionChain::new(Vec::new()).expect("empty chain");
        assert!(chain.head().is_none());
    }

    #[rstest]
    fn rejects_second_root() {
        let error = RevisionChain::new(vec![unit("001_a", None), unit("002_b", None)])
            .expect_err("two roots");
        assert_eq!(
            error,
            RevisionChainError::MultipleRoots {
                first: "001_a",
                second: "002_b"
            }
        );
    }

    #[rstest]
    fn rejects_fork() {
        let error = RevisionChain::new(vec![
            unit("001_a", None),
            unit("002_b", Some("001_a")),
            unit("002_c", Some("001_a")),
        ])
        .expect_err("fork");
        assert!(matches!(error, RevisionChainError::Fork { parent: "001_a", .. }));
    }

    #[rstest]
    fn rejects_unknown_predecessor() {
        let error = RevisionChain::new(vec![unit("001_a", None), unit("003_c", Some("002_b"))])
            .expect_err("dangling predecessor");
        assert_eq!(
            error,
            RevisionChainError::UnknownPredecessor {
                id: "003_c",
                down_revision: "002_b"
            }
        );
    }

    #[rstest]
    fn rejects_cycle_detached_from_root() {
        let error = RevisionChain::new(vec![
            unit("001_a", None),
            unit("002_b", Some("003_c")),
            unit("003_c", Some("002_b")),
        ])
        .expect_err("cycle");
        assert!(matches!(error, RevisionChainError::Unreachable { .. }));
    }

    #[rstest]
    fn rejects_versions_sorting_before_predecessor() {
        let error = RevisionChain::new(vec![unit("002_a", None), unit("001_b", Some("002_a"))])
            .expect_err("out of order");
        assert_eq!(
            error,
            RevisionChainError::OutOfOrder {
                id: "001_b",
                down_revision: "002_a"
            }
        );
    }

    #[rstest]
    fn rejects_missing_root_and_duplicates() {
        assert_eq!(
            RevisionChain::new(vec![unit("002_b", Some("002_b"))]),
            Err(RevisionChainError::MissingRoot)
        );
        assert_eq!(
            RevisionChain::new(vec![unit("001_a", None), unit("001_a", None)]),
            Err(RevisionChainError::DuplicateRevision { id: "001_a" })
        );
    }

    #[rstest]
    fn registered_migrations_start_with_initial_schema() {
        let chain = registered_migrations().expect("registry should be valid");
        let head = chain.head().expect("head revision");
        assert_eq!(head.id, "001_initial_schema");
        assert_eq!(head.down_revision, None);
        let unit = chain.get("001_initial_schema").expect("initial unit");
        assert!(unit.upgrade_sql().starts_with("CREATE TYPE userrole AS ENUM ('candidate', 'recruiter');\n"));
        assert!(unit.downgrade_sql().ends_with("DROP TYPE IF EXISTS userrole;\n"));
    }
}
