//! Privilege repair for the role the tooling connects as.
//!
//! The plan is fixed: schema usage, existing tables and sequences, default
//! privileges for future objects, and the database itself. Statements run
//! one at a time so a rejected grant never prevents the rest from being
//! attempted, and every outcome is reported.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::ports::{PrivilegeRepository, PrivilegeRepositoryError};
use crate::domain::schema::ddl::quote_identifier;

/// Placeholder used in remediation output when the role is unknown.
pub const ROLE_PLACEHOLDER: &str = "your_user";
/// Placeholder used in remediation output when the database is unknown.
pub const DATABASE_PLACEHOLDER: &str = "your_database";

/// Role and database reported by the server for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseIdentity {
    pub role: String,
    pub database: String,
}

/// The six statements granting `identity` what migrations and the
/// application need, in execution order.
///
/// # Examples
///
/// ```rust
/// use recruit_db::domain::{DatabaseIdentity, grant_statements};
///
/// let identity = DatabaseIdentity {
///     role: "recruit".to_owned(),
///     database: "recruit_prod".to_owned(),
/// };
/// let statements = grant_statements(&identity, "public");
/// assert_eq!(statements[0], "GRANT USAGE, CREATE ON SCHEMA public TO recruit");
/// assert_eq!(statements.len(), 6);
/// ```
pub fn grant_statements(identity: &DatabaseIdentity, schema: &str) -> Vec<String> {
    render_plan(
        &quote_identifier(&identity.role),
        &quote_identifier(&identity.database),
        &quote_identifier(schema),
    )
}

fn render_plan(role: &str, database: &str, schema: &str) -> Vec<String> {
    vec![
        format!("GRANT USAGE, CREATE ON SCHEMA {schema} TO {role}"),
        format!("GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA {schema} TO {role}"),
        format!("GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA {schema} TO {role}"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} GRANT ALL ON TABLES TO {role}"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} GRANT ALL ON SEQUENCES TO {role}"),
        format!("GRANT ALL PRIVILEGES ON DATABASE {database} TO {role}"),
    ]
}

/// Result of running one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GrantOutcome {
    Applied,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantResult {
    pub statement: String,
    #[serde(flatten)]
    pub outcome: GrantOutcome,
}

impl GrantResult {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, GrantOutcome::Applied)
    }
}

/// Outcome of a repair run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRepairReport {
    pub schema: String,
    /// `None` when the identity could not be discovered.
    pub identity: Option<DatabaseIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_error: Option<String>,
    pub results: Vec<GrantResult>,
}

impl PermissionRepairReport {
    /// True when the identity was discovered and every statement applied.
    pub fn is_success(&self) -> bool {
        self.identity.is_some() && self.results.iter().all(GrantResult::is_applied)
    }

    pub fn failures(&self) -> impl Iterator<Item = &GrantResult> {
        self.results.iter().filter(|result| !result.is_applied())
    }

    /// Why the repair did not succeed, or `None` when it did.
    ///
    /// An identity failure takes precedence because no statement ran.
    pub fn failure_summary(&self) -> Option<String> {
        if let Some(error) = &self.identity_error {
            return Some(error.clone());
        }
        if self.is_success() {
            return None;
        }
        Some(format!(
            "{} of {} privilege statements failed",
            self.failures().count(),
            self.results.len()
        ))
    }

    /// Statements an administrator should run by hand, or `None` when the
    /// repair succeeded.
    ///
    /// Unknown role or database names are replaced by [`ROLE_PLACEHOLDER`]
    /// and [`DATABASE_PLACEHOLDER`].
    pub fn manual_remediation(&self) -> Option<Vec<String>> {
        if self.is_success() {
            return None;
        }
        let statements = match &self.identity {
            Some(identity) => grant_statements(identity, &self.schema),
            None => render_plan(
                ROLE_PLACEHOLDER,
                DATABASE_PLACEHOLDER,
                &quote_identifier(&self.schema),
            ),
        };
        Some(
            statements
                .into_iter()
                .map(|statement| format!("{statement};"))
                .collect(),
        )
    }
}

/// Runs the grant plan against a [`PrivilegeRepository`].
#[derive(Debug, Clone)]
pub struct PermissionRepairService {
    schema: String,
}

impl PermissionRepairService {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    /// Discover the identity and attempt every statement.
    ///
    /// Never fails: identity and statement errors are captured in the
    /// report.
    pub fn repair(&self, repository: &mut dyn PrivilegeRepository) -> PermissionRepairReport {
        let identity = match repository.current_identity() {
            Ok(identity) => identity,
            Err(error) => {
                warn!(error = %error, "could not discover database identity");
                return PermissionRepairReport {
                    schema: self.schema.clone(),
                    identity: None,
                    identity_error: Some(error.to_string()),
                    results: Vec::new(),
                };
            }
        };
        info!(
            role = %identity.role,
            database = %identity.database,
            schema = %self.schema,
            "repairing privileges"
        );

        let results = grant_statements(&identity, &self.schema)
            .into_iter()
            .map(|statement| {
                let outcome = match repository.execute_grant(&statement) {
                    Ok(()) => {
                        info!(%statement, "privilege statement applied");
                        GrantOutcome::Applied
                    }
                    Err(error) => {
                        warn!(%statement, error = %error, "privilege statement failed");
                        GrantOutcome::Failed {
                            reason: failure_reason(error),
                        }
                    }
                };
                GrantResult { statement, outcome }
            })
            .collect();

        PermissionRepairReport {
            schema: self.schema.clone(),
            identity: Some(identity),
            identity_error: None,
            results,
        }
    }
}

fn failure_reason(error: PrivilegeRepositoryError) -> String {
    match error {
        PrivilegeRepositoryError::Statement { message }
        | PrivilegeRepositoryError::Connection { message }
        | PrivilegeRepositoryError::Identity { message } => message,
    }
}
