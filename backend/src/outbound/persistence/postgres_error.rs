//! Rendering of `postgres` driver errors.

/// Render a `postgres` error with SQLSTATE, message, detail and hint.
///
/// The driver's `Display` often collapses server errors to `db error`, which
/// hides the part an operator needs.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "{} (SQLSTATE {})",
        db_error.message(),
        db_error.code().code()
    );
    for (label, value) in [("detail", db_error.detail()), ("hint", db_error.hint())] {
        if let Some(value) = value {
            summary.push_str("; ");
            summary.push_str(label);
            summary.push_str(": ");
            summary.push_str(value);
        }
    }
    summary
}
