//! Repository Module
//!
//! Free functions over a `&SqlitePool`, one module per table.

pub mod admin;
pub mod department;
pub mod issue;

use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// UNIQUE index violation on `field`
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: String, value: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let field = unique_violation_field(db_err.message()).unwrap_or("unknown");
            return RepoError::Duplicate {
                field: field.to_string(),
                value: String::new(),
            };
        }
        RepoError::Database(err.to_string())
    }
}

/// Column named in a SQLite message like `UNIQUE constraint failed: department.code`
fn unique_violation_field(message: &str) -> Option<&str> {
    let columns = message.split_once("UNIQUE constraint failed:")?.1;
    let first = columns.split(',').next()?.trim();
    first.rsplit('.').next().filter(|s| !s.is_empty())
}

impl RepoError {
    /// Attach the offending value to a duplicate error
    pub fn with_duplicate_value(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        match self {
            RepoError::Duplicate { field, value } if value.is_empty() => {
                let value = lookup(&field).unwrap_or_default();
                RepoError::Duplicate { field, value }
            }
            other => other,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate { field, value } => {
                let code = match field.as_str() {
                    "code" => ErrorCode::DepartmentCodeExists,
                    "contact_email" => ErrorCode::DepartmentEmailExists,
                    "name" => ErrorCode::DepartmentNameExists,
                    "account_id" => ErrorCode::DepartmentAccountBound,
                    _ => ErrorCode::AlreadyExists,
                };
                AppError::conflict(code, field, value)
            }
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_field() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: department.code"),
            Some("code")
        );
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: department.contact_email"),
            Some("contact_email")
        );
        assert_eq!(unique_violation_field("disk I/O error"), None);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = RepoError::Duplicate {
            field: "code".into(),
            value: String::new(),
        }
        .with_duplicate_value(|_| Some("ROADS".into()));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::DepartmentCodeExists);
        assert_eq!(app.errors[0].value, Some(serde_json::json!("ROADS")));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Pot_Hole"), "%pot\\_hole%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
    }
}
