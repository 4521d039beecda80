//! The recruiting platform schema created by revision `001_initial_schema`.

use super::{
    Column, ColumnType, EnumType, ForeignKey, Index, SchemaDefinition, Table, UniqueConstraint,
};
use crate::domain::enumerations::{PersistedEnum, TestStatus, UserRole};

const NOW: &str = "now()";

/// Build the initial schema: two enumerations and six tables, parents first.
///
/// # Examples
///
/// ```rust
/// use recruit_db::domain::schema::initial_schema;
///
/// let schema = initial_schema();
/// let names: Vec<_> = schema.tables.iter().map(|table| table.name).collect();
/// assert_eq!(names.first(), Some(&"users"));
/// ```
pub fn initial_schema() -> SchemaDefinition {
    SchemaDefinition {
        enums: vec![EnumType::of::<UserRole>(), EnumType::of::<TestStatus>()],
        tables: vec![
            users(),
            tests(),
            candidate_applications(),
            assessments(),
            revoked_tokens(),
            logs(),
        ],
    }
}

fn users() -> Table {
    Table::new("users")
        .column(Column::required("user_id", ColumnType::Serial))
        .column(Column::required("name", ColumnType::Varchar(Some(100))))
        .column(Column::required("email", ColumnType::Varchar(Some(100))))
        .column(Column::required("role", ColumnType::Enum(UserRole::SQL_TYPE)))
        .column(Column::required("hashed_password", ColumnType::Varchar(None)))
        .column(Column::optional("created_at", ColumnType::TimestampTz).server_default(NOW))
        .column(Column::optional("updated_at", ColumnType::TimestampTz).server_default(NOW))
        .primary_key(&["user_id"])
        .index(Index::new("ix_users_user_id", &["user_id"]))
        .index(Index::unique("ix_users_email", &["email"]))
}

fn tests() -> Table {
    let status = Column::required("status", ColumnType::Enum(TestStatus::SQL_TYPE))
        .application_default(TestStatus::APPLICATION_DEFAULT.as_str());

    Table::new("tests")
        .column(Column::required("test_id", ColumnType::Serial))
        .column(Column::required("test_name", ColumnType::Varchar(Some(200))))
        .column(Column::optional("job_description", ColumnType::Text))
        .column(Column::optional("parsed_job_description", ColumnType::Text))
        .column(Column::optional("skill_graph", ColumnType::Text))
        .column(Column::optional("resume_score_threshold", ColumnType::Integer))
        .column(Column::optional("max_shortlisted_candidates", ColumnType::Integer))
        .column(Column::optional("auto_shortlist", ColumnType::Boolean).application_default("false"))
        .column(Column::optional("total_questions", ColumnType::Integer))
        .column(Column::optional("time_limit_minutes", ColumnType::Integer))
        .column(Column::optional("total_marks", ColumnType::Integer))
        .column(status)
        .column(Column::optional("is_published", ColumnType::Boolean).application_default("false"))
        .column(Column::optional("scheduled_at", ColumnType::TimestampTz))
        .column(Column::optional("application_deadline", ColumnType::TimestampTz))
        .column(Column::optional("assessment_deadline", ColumnType::TimestampTz))
        .column(Column::required("created_by", ColumnType::Integer))
        .column(Column::optional("updated_by", ColumnType::Integer))
        .column(Column::optional("created_at", ColumnType::TimestampTz).server_default(NOW))
        .column(Column::optional("updated_at", ColumnType::TimestampTz).server_default(NOW))
        .column(priority_counter("high_priority_questions"))
        .column(priority_counter("medium_priority_questions"))
        .column(priority_counter("low_priority_questions"))
        .column(priority_counter("high_priority_nodes"))
        .column(priority_counter("medium_priority_nodes"))
        .column(priority_counter("low_priority_nodes"))
        .primary_key(&["test_id"])
        .foreign_key(ForeignKey::new(&["created_by"], "users", &["user_id"]))
        .foreign_key(ForeignKey::new(&["updated_by"], "users", &["user_id"]))
        .index(Index::new("ix_tests_test_id", &["test_id"]))
}

fn priority_counter(name: &'static str) -> Column {
    Column::optional(name, ColumnType::Integer).application_default("0")
}

fn candidate_applications() -> Table {
    Table::new("candidate_applications")
        .column(Column::required("application_id", ColumnType::Serial))
        .column(Column::required("user_id", ColumnType::Integer))
        .column(Column::required("test_id", ColumnType::Integer))
        .column(Column::required("resume_link", ColumnType::Varchar(None)))
        .column(Column::optional("resume_text", ColumnType::Text))
        .column(Column::optional("parsed_resume", ColumnType::Text))
        .column(Column::optional("resume_score", ColumnType::Integer))
        .column(Column::optional("skill_match_percentage", ColumnType::Float))
        .column(Column::optional("experience_score", ColumnType::Integer))
        .column(Column::optional("education_score", ColumnType::Integer))
        .column(Column::optional("ai_reasoning", ColumnType::Text))
        .column(Column::optional("is_shortlisted", ColumnType::Boolean).application_default("false"))
        .column(Column::optional("shortlist_reason", ColumnType::Text))
        .column(Column::optional("screening_completed_at", ColumnType::Timestamp))
        .column(
            Column::required("screening_status", ColumnType::Varchar(Some(20)))
                .application_default("pending"),
        )
        .column(Column::optional("notified_at", ColumnType::Timestamp))
        .column(Column::optional("applied_at", ColumnType::Timestamp))
        .column(Column::optional("updated_at", ColumnType::Timestamp))
        .primary_key(&["application_id"])
        .foreign_key(ForeignKey::new(&["user_id"], "users", &["user_id"]))
        .foreign_key(ForeignKey::new(&["test_id"], "tests", &["test_id"]))
        .unique(UniqueConstraint::new(
            "unique_user_test_application",
            &["user_id", "test_id"],
        ))
        .index(Index::new(
            "ix_candidate_applications_application_id",
            &["application_id"],
        ))
}

fn assessments() -> Table {
    Table::new("assessments")
        .column(Column::required("assessment_id", ColumnType::Serial))
        .column(Column::required("application_id", ColumnType::Integer))
        .column(Column::required("user_id", ColumnType::Integer))
        .column(Column::required("test_id", ColumnType::Integer))
        .column(
            Column::optional("status", ColumnType::Varchar(Some(20)))
                .application_default("in_progress"),
        )
        .column(Column::optional("percentage_score", ColumnType::Float))
        .column(Column::optional("start_time", ColumnType::TimestampTz))
        .column(Column::optional("end_time", ColumnType::TimestampTz))
        .column(Column::optional("created_at", ColumnType::TimestampTz))
        .column(Column::optional("updated_at", ColumnType::TimestampTz))
        .column(Column::optional("report", ColumnType::Json))
        .column(Column::optional("result", ColumnType::Json))
        .primary_key(&["assessment_id"])
        .foreign_key(ForeignKey::new(
            &["application_id"],
            "candidate_applications",
            &["application_id"],
        ))
        .foreign_key(ForeignKey::new(&["user_id"], "users", &["user_id"]))
        .foreign_key(ForeignKey::new(&["test_id"], "tests", &["test_id"]))
        .index(Index::new("ix_assessments_assessment_id", &["assessment_id"]))
}

fn revoked_tokens() -> Table {
    Table::new("revoked_tokens")
        .column(Column::required("id", ColumnType::Serial))
        .column(Column::required("jti", ColumnType::Varchar(None)))
        .column(Column::optional("revoked_at", ColumnType::Timestamp))
        .primary_key(&["id"])
        .index(Index::new("ix_revoked_tokens_id", &["id"]))
        .index(Index::unique("ix_revoked_tokens_jti", &["jti"]))
}

fn logs() -> Table {
    Table::new("logs")
        .column(Column::required("id", ColumnType::Serial))
        .column(Column::required("timestamp", ColumnType::TimestampTz))
        .column(Column::required("action", ColumnType::Varchar(Some(255))))
        .column(Column::required("status", ColumnType::Varchar(Some(50))))
        .column(Column::optional("details", ColumnType::Text))
        .column(Column::optional("user", ColumnType::Varchar(Some(255))))
        .column(Column::optional("entity", ColumnType::Varchar(Some(255))))
        .column(Column::optional("source", ColumnType::Varchar(Some(255))))
        .primary_key(&["id"])
}
