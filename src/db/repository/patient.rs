use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::repository::parse_dt;
use crate::db::DatabaseError;
use crate::models::patient::{Patient, Sex};

/// Partial update; `None` fields keep their stored values.
#[derive(Debug, Default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (patient_id, name, phone, date_of_birth, sex, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient.patient_id,
            patient.name,
            patient.phone,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.sex.map(Sex::as_str),
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        "SELECT patient_id, name, phone, date_of_birth, sex, created_at, updated_at
         FROM patients WHERE patient_id = ?1",
        params![patient_id],
        row_to_patient,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn patient_exists(conn: &Connection, patient_id: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM patients WHERE patient_id = ?1",
            params![patient_id],
            |row| row.get(0),
        )
        .map_err(DatabaseError::from)?;
    Ok(count > 0)
}

pub fn update_patient(
    conn: &Connection,
    patient_id: &str,
    patch: &PatientPatch,
) -> Result<Patient, DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET
             name = COALESCE(?2, name),
             phone = COALESCE(?3, phone),
             date_of_birth = COALESCE(?4, date_of_birth),
             sex = COALESCE(?5, sex),
             updated_at = ?6
         WHERE patient_id = ?1",
        params![
            patient_id,
            patch.name,
            patch.phone,
            patch.date_of_birth.map(|d| d.to_string()),
            patch.sex.map(Sex::as_str),
            Utc::now().to_rfc3339(),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient_id.into(),
        });
    }
    get_patient(conn, patient_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: patient_id.into(),
    })
}

pub fn delete_patient(conn: &Connection, patient_id: &str) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM patients WHERE patient_id = ?1",
        params![patient_id],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient_id.into(),
        });
    }
    Ok(())
}

/// List patients, newest first, with an optional case-insensitive name
/// search. `page` is 1-indexed.
pub fn list_patients(
    conn: &Connection,
    search: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Patient>, i64), DatabaseError> {
    let pattern = search.map(|s| format!("%{s}%"));
    // Saturate: an absurd page number is an empty page, not an overflow.
    let offset = (page - 1).saturating_mul(limit);

    let mut stmt = conn.prepare(
        "SELECT patient_id, name, phone, date_of_birth, sex, created_at, updated_at
         FROM patients
         WHERE (?1 IS NULL OR name LIKE ?1)
         ORDER BY created_at DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(params![pattern, limit, offset], row_to_patient)?;
    let items = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE (?1 IS NULL OR name LIKE ?1)",
        params![pattern],
        |row| row.get(0),
    )?;
    Ok((items, total))
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    let dob_str: Option<String> = row.get(3)?;
    let sex_str: Option<String> = row.get(4)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(Patient {
        patient_id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        date_of_birth: dob_str.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        sex: sex_str.and_then(|s| Sex::parse(&s)),
        created_at: parse_dt(5, &created_str)?,
        updated_at: parse_dt(6, &updated_str)?,
    })
}
