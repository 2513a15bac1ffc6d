pub mod schema;
pub mod contact_repo;
pub mod address_repo;

use rusqlite::ErrorCode;

/// True when `err` is a UNIQUE constraint failure on `table.column`.
pub fn is_unique_violation(err: &rusqlite::Error, table: &str, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(message)) => {
            e.code == ErrorCode::ConstraintViolation
                && message.contains("UNIQUE")
                && message.contains(&format!("{}.{}", table, column))
        }
        _ => false,
    }
}
