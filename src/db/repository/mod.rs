pub mod certificate;
pub mod patient;
pub mod record;
pub mod user;

use chrono::{DateTime, Utc};

/// Parse an RFC3339 timestamp stored as TEXT.
pub(crate) fn parse_dt(column: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
