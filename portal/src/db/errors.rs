use thiserror::Error;

/// Store-level failures that handlers can react to
#[derive(Error, Debug)]
pub enum DbError {
    /// Unique constraint violation
    #[error("Unique constraint violation on {}", column.as_deref().unwrap_or("unknown column"))]
    UniqueViolation {
        table: Option<String>,
        column: Option<String>,
        message: String,
    },

    /// Check constraint violation, e.g. a profile outside the fixed role set
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Anything else the store reports; surfaced to clients as a 500
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let (table, column) = parse_unique_target(db_err.message());
                DbError::UniqueViolation {
                    table,
                    column,
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => DbError::CheckViolation {
                message: db_err.message().to_string(),
            },
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// SQLite does not expose constraint names, only a message like
/// `UNIQUE constraint failed: employees.email`.
fn parse_unique_target(message: &str) -> (Option<String>, Option<String>) {
    let Some((_, target)) = message.split_once("failed:") else {
        return (None, None);
    };
    // Composite keys are reported as a comma separated list; the first column is enough here
    let first = target.split(',').next().unwrap_or_default().trim();
    match first.split_once('.') {
        Some((table, column)) => (Some(table.to_string()), Some(column.to_string())),
        None => (None, None),
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
