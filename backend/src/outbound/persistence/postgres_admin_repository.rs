//! Administrative connection used by `fix-permissions` and `reset-migrations`.

use std::sync::{Arc, Mutex};

use postgres::error::{DbError, SqlState};
use postgres::{Client, Config, NoTls};
use thiserror::Error;
use tracing::debug;

use crate::domain::permissions::DatabaseIdentity;
use crate::domain::ports::{
    MigrationStateRepository, MigrationStateRepositoryError, PrivilegeRepository,
    PrivilegeRepositoryError,
};
use crate::domain::QualifiedTable;

use super::postgres_error::format_postgres_error;

/// The database could not be reached or did not answer a probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminConnectionError {
    #[error("cannot connect to database: {message}")]
    Connect { message: String },
    #[error("database did not answer the connection probe: {message}")]
    Probe { message: String },
}

/// A notice or warning the server sent alongside a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerNotice {
    code: String,
    message: String,
}

impl From<DbError> for ServerNotice {
    fn from(notice: DbError) -> Self {
        Self {
            code: notice.code().code().to_owned(),
            message: notice.message().to_owned(),
        }
    }
}

/// PostgreSQL accepts a grant the role may not make and only warns.
fn ungranted_privilege(notices: &[ServerNotice]) -> Option<String> {
    notices
        .iter()
        .find(|notice| notice.code == SqlState::WARNING_PRIVILEGE_NOT_GRANTED.code())
        .map(|notice| format!("{} (SQLSTATE {})", notice.message, notice.code))
}

/// Autocommit `postgres` client; each grant takes effect on its own.
pub struct PostgresAdminRepository {
    client: Client,
    notices: Arc<Mutex<Vec<ServerNotice>>>,
}

impl PostgresAdminRepository {
    pub fn connect(database_url: &str) -> Result<Self, AdminConnectionError> {
        let connect_error = |error: postgres::Error| AdminConnectionError::Connect {
            message: format_postgres_error(&error),
        };
        let mut config: Config = database_url.parse().map_err(connect_error)?;
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        config.notice_callback(move |notice| {
            if let Ok(mut collected) = sink.lock() {
                collected.push(ServerNotice::from(notice));
            }
        });
        let client = config.connect(NoTls).map_err(connect_error)?;
        Ok(Self { client, notices })
    }

    fn take_notices(&self) -> Vec<ServerNotice> {
        self.notices
            .lock()
            .map(|mut collected| std::mem::take(&mut *collected))
            .unwrap_or_default()
    }

    /// Round-trip `SELECT 1`.
    pub fn probe(&mut self) -> Result<(), AdminConnectionError> {
        self.client
            .query_one("SELECT 1", &[])
            .map(|_| ())
            .map_err(|error| AdminConnectionError::Probe {
                message: format_postgres_error(&error),
            })
    }
}

impl PrivilegeRepository for PostgresAdminRepository {
    fn current_identity(&mut self) -> Result<DatabaseIdentity, PrivilegeRepositoryError> {
        let row = self
            .client
            .query_one(
                "SELECT current_user::text AS role, current_database()::text AS database",
                &[],
            )
            .map_err(|error| PrivilegeRepositoryError::identity(format_postgres_error(&error)))?;
        Ok(DatabaseIdentity {
            role: row.get("role"),
            database: row.get("database"),
        })
    }

    fn execute_grant(&mut self, statement: &str) -> Result<(), PrivilegeRepositoryError> {
        debug!(statement, "executing grant");
        self.take_notices();
        self.client
            .batch_execute(statement)
            .map_err(|error| PrivilegeRepositoryError::statement(format_postgres_error(&error)))?;
        match ungranted_privilege(&self.take_notices()) {
            Some(warning) => Err(PrivilegeRepositoryError::statement(warning)),
            None => Ok(()),
        }
    }
}

impl MigrationStateRepository for PostgresAdminRepository {
    fn drop_version_table(
        &mut self,
        table: &QualifiedTable,
    ) -> Result<bool, MigrationStateRepositoryError> {
        let query_error =
            |error: postgres::Error| MigrationStateRepositoryError::query(format_postgres_error(&error));

        // Dropping the transaction without commit rolls back.
        let mut transaction = self.client.transaction().map_err(query_error)?;
        let existed: bool = transaction
            .query_one("SELECT to_regclass($1::text) IS NOT NULL", &[&table.sql()])
            .map_err(query_error)?
            .get(0);
        transaction
            .batch_execute(&format!("DROP TABLE IF EXISTS {} CASCADE", table.sql()))
            .map_err(query_error)?;
        transaction.commit().map_err(query_error)?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    //! Warning classification for grant statements.

    use super::*;
    use rstest::rstest;

    fn notice(code: &str, message: &str) -> ServerNotice {
        ServerNotice {
            code: code.to_owned(),
            message: message.to_owned(),
        }
    }

    #[rstest]
    fn privilege_not_granted_warning_is_a_failure() {
        let notices = [
            notice("00000", "unrelated notice"),
            notice("01007", "no privileges were granted for \"public\""),
        ];
        assert_eq!(
            ungranted_privilege(&notices).as_deref(),
            Some("no privileges were granted for \"public\" (SQLSTATE 01007)")
        );
    }

    #[rstest]
    #[case::none(&[])]
    #[case::plain_notice(&[("00000", "relation already has the privileges")])]
    #[case::other_warning(&[("01000", "something to note")])]
    fn other_notices_leave_the_grant_applied(#[case] raw: &[(&str, &str)]) {
        let notices: Vec<_> = raw
            .iter()
            .map(|(code, message)| notice(code, message))
            .collect();
        assert_eq!(ungranted_privilege(&notices), None);
    }
}
