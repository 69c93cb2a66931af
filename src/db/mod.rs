pub mod repository;
pub mod sqlite;

pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate {entity_type} on {field}")]
    Duplicate { entity_type: String, field: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

impl From<rusqlite::Error> for DatabaseError {
    /// Translate unique-index violations into `Duplicate` so callers can
    /// map them to 4xx conflicts instead of a generic 500.
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("UNIQUE constraint failed")
            {
                // Message shape: "UNIQUE constraint failed: table.column"
                let detail = msg.rsplit(": ").next().unwrap_or("");
                let (entity_type, field) = detail
                    .split_once('.')
                    .map(|(t, f)| (t.to_string(), f.to_string()))
                    .unwrap_or_else(|| ("unknown".into(), detail.to_string()));
                return DatabaseError::Duplicate { entity_type, field };
            }
        }
        DatabaseError::Sqlite(err)
    }
}
