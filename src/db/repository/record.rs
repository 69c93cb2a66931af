use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db::repository::parse_dt;
use crate::db::DatabaseError;
use crate::models::record::{ClinicalRecord, CreatedBy, RecordType};
use crate::models::user::Role;

/// Filters for record listing. All optional; combined with AND.
#[derive(Debug, Default)]
pub struct RecordFilter {
    pub record_type: Option<RecordType>,
    pub tag: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Partial update. The record's type is immutable and absent here on
/// purpose; payloads are validated against the stored type upstream.
#[derive(Debug, Default)]
pub struct RecordPatch {
    pub payload: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub effective_at: Option<DateTime<Utc>>,
}

pub fn insert_record(conn: &Connection, record: &ClinicalRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinical_records
             (record_id, patient_id, record_type, payload,
              created_by_user_id, created_by_username, created_by_role,
              tags, effective_at, fhir_ref, revision, deleted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12, ?13)",
        params![
            record.record_id,
            record.patient_id,
            record.record_type.as_str(),
            record.payload.to_string(),
            record.created_by.user_id,
            record.created_by.username,
            record.created_by.role.as_str(),
            serde_json::to_string(&record.tags).unwrap_or_else(|_| "[]".into()),
            record.effective_at.map(|dt| dt.to_rfc3339()),
            record.fhir_ref.as_ref().map(Value::to_string),
            record.revision,
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

const RECORD_COLUMNS: &str = "record_id, patient_id, record_type, payload,
     created_by_user_id, created_by_username, created_by_role,
     tags, effective_at, fhir_ref, revision, deleted_at, created_at, updated_at";

/// Fetch a live record. Soft-deleted rows are invisible.
pub fn get_record(
    conn: &Connection,
    record_id: &str,
) -> Result<Option<ClinicalRecord>, DatabaseError> {
    conn.query_row(
        &format!(
            "SELECT {RECORD_COLUMNS} FROM clinical_records
             WHERE record_id = ?1 AND deleted_at IS NULL"
        ),
        params![record_id],
        row_to_record,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Apply a patch and bump the revision in one statement, so concurrent
/// updates cannot lose an increment. Soft-deleted records are not
/// selectable for update.
pub fn update_record(
    conn: &Connection,
    record_id: &str,
    patch: &RecordPatch,
) -> Result<ClinicalRecord, DatabaseError> {
    let affected = conn.execute(
        "UPDATE clinical_records SET
             payload = COALESCE(?2, payload),
             tags = COALESCE(?3, tags),
             effective_at = COALESCE(?4, effective_at),
             revision = revision + 1,
             updated_at = ?5
         WHERE record_id = ?1 AND deleted_at IS NULL",
        params![
            record_id,
            patch.payload.as_ref().map(Value::to_string),
            patch
                .tags
                .as_ref()
                .map(|t| serde_json::to_string(t).unwrap_or_else(|_| "[]".into())),
            patch.effective_at.map(|dt| dt.to_rfc3339()),
            Utc::now().to_rfc3339(),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "clinical_record".into(),
            id: record_id.into(),
        });
    }
    get_record(conn, record_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "clinical_record".into(),
        id: record_id.into(),
    })
}

/// Mark a record deleted. Already-deleted and unknown records both
/// report `NotFound`.
pub fn soft_delete_record(conn: &Connection, record_id: &str) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE clinical_records SET deleted_at = ?2, updated_at = ?2
         WHERE record_id = ?1 AND deleted_at IS NULL",
        params![record_id, Utc::now().to_rfc3339()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "clinical_record".into(),
            id: record_id.into(),
        });
    }
    Ok(())
}

/// List live records for a patient, effective clinical time descending
/// with creation time as tie-break, offset-paginated (1-indexed).
pub fn list_records(
    conn: &Connection,
    patient_id: &str,
    filter: &RecordFilter,
    page: i64,
    limit: i64,
) -> Result<(Vec<ClinicalRecord>, i64), DatabaseError> {
    let type_str = filter.record_type.map(RecordType::as_str);
    let from_str = filter.from.map(|dt| dt.to_rfc3339());
    let to_str = filter.to.map(|dt| dt.to_rfc3339());
    // Saturate: an absurd page number is an empty page, not an overflow.
    let offset = (page - 1).saturating_mul(limit);

    const WHERE_CLAUSE: &str = "patient_id = ?1 AND deleted_at IS NULL
         AND (?2 IS NULL OR record_type = ?2)
         AND (?3 IS NULL OR EXISTS (
             SELECT 1 FROM json_each(clinical_records.tags) WHERE json_each.value = ?3))
         AND (?4 IS NULL OR effective_at >= ?4)
         AND (?5 IS NULL OR effective_at <= ?5)";

    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM clinical_records
         WHERE {WHERE_CLAUSE}
         ORDER BY effective_at IS NULL, effective_at DESC, created_at DESC
         LIMIT ?6 OFFSET ?7"
    ))?;
    let rows = stmt.query_map(
        params![patient_id, type_str, filter.tag, from_str, to_str, limit, offset],
        row_to_record,
    )?;
    let items = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)?;

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM clinical_records WHERE {WHERE_CLAUSE}"),
        params![patient_id, type_str, filter.tag, from_str, to_str],
        |row| row.get(0),
    )?;
    Ok((items, total))
}

fn row_to_record(row: &rusqlite::Row) -> Result<ClinicalRecord, rusqlite::Error> {
    let type_str: String = row.get(2)?;
    let payload_str: String = row.get(3)?;
    let role_str: String = row.get(6)?;
    let tags_str: String = row.get(7)?;
    let effective_str: Option<String> = row.get(8)?;
    let fhir_str: Option<String> = row.get(9)?;
    let deleted_str: Option<String> = row.get(11)?;
    let created_str: String = row.get(12)?;
    let updated_str: String = row.get(13)?;

    let record_type = RecordType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown record type '{type_str}'").into(),
        )
    })?;

    Ok(ClinicalRecord {
        record_id: row.get(0)?,
        patient_id: row.get(1)?,
        record_type,
        payload: serde_json::from_str(&payload_str).unwrap_or(Value::Null),
        created_by: CreatedBy {
            user_id: row.get(4)?,
            username: row.get(5)?,
            role: Role::parse(&role_str).unwrap_or(Role::Clinician),
        },
        tags: serde_json::from_str(&tags_str).unwrap_or_default(),
        effective_at: effective_str.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        fhir_ref: fhir_str.as_deref().and_then(|s| serde_json::from_str(s).ok()),
        revision: row.get(10)?,
        deleted_at: deleted_str.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        created_at: parse_dt(12, &created_str)?,
        updated_at: parse_dt(13, &updated_str)?,
    })
}
