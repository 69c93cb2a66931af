use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_dt, patient::insert_patient};
use crate::db::DatabaseError;
use crate::models::patient::Patient;
use crate::models::user::{Role, User};

/// Insert a user account. Unique-index violations on `username` surface
/// as `DatabaseError::Duplicate`.
pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, role, linked_patient_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.linked_patient_id,
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        "SELECT id, username, password_hash, role, linked_patient_id, created_at, updated_at
         FROM users WHERE username = ?1",
        params![username],
        row_to_user,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Create a patient profile and its linked user account as a single
/// transaction. A partial write would leave either an orphaned patient
/// or a user with a dangling linkage, so nothing is durable until
/// commit.
pub fn insert_patient_with_user(
    conn: &mut Connection,
    patient: &Patient,
    user: &User,
) -> Result<(), DatabaseError> {
    let tx = conn.transaction().map_err(DatabaseError::from)?;
    insert_patient(&tx, patient)?;
    tx.execute(
        "INSERT INTO users (id, username, password_hash, role, linked_patient_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.linked_patient_id,
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )?;
    tx.commit().map_err(DatabaseError::from)
}

fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(User {
        id: Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: Role::parse(&role_str).unwrap_or(Role::Clinician),
        linked_patient_id: row.get(4)?,
        created_at: parse_dt(5, &created_str)?,
        updated_at: parse_dt(6, &updated_str)?,
    })
}
