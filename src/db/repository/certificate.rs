use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::repository::parse_dt;
use crate::db::DatabaseError;
use crate::models::certificate::{CertStatus, CertType, Certificate};

/// Partial update; `None` fields keep their stored values. The status
/// transition rules (forward-only, timestamp stamping) are applied
/// upstream — this layer just persists the resolved patch.
#[derive(Debug, Default)]
pub struct CertificatePatch {
    pub status: Option<CertStatus>,
    pub url: Option<String>,
    pub hash: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub verify_code: Option<String>,
    pub qr_payload: Option<String>,
}

pub fn insert_certificate(conn: &Connection, cert: &Certificate) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO certificates
             (certificate_id, patient_id, cert_type, status, issued_at, revoked_at,
              hash, url, verify_code, qr_payload, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            cert.certificate_id,
            cert.patient_id,
            cert.cert_type.as_str(),
            cert.status.as_str(),
            cert.issued_at.map(|dt| dt.to_rfc3339()),
            cert.revoked_at.map(|dt| dt.to_rfc3339()),
            cert.hash,
            cert.url,
            cert.verify_code,
            cert.qr_payload,
            cert.created_at.to_rfc3339(),
            cert.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

const CERT_COLUMNS: &str = "certificate_id, patient_id, cert_type, status, issued_at, revoked_at,
     hash, url, verify_code, qr_payload, created_at, updated_at";

pub fn get_certificate(
    conn: &Connection,
    certificate_id: &str,
) -> Result<Option<Certificate>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {CERT_COLUMNS} FROM certificates WHERE certificate_id = ?1"),
        params![certificate_id],
        row_to_certificate,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Resolve a certificate by its exact verify code.
pub fn find_by_verify_code(
    conn: &Connection,
    code: &str,
) -> Result<Option<Certificate>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {CERT_COLUMNS} FROM certificates WHERE verify_code = ?1"),
        params![code],
        row_to_certificate,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn update_certificate(
    conn: &Connection,
    certificate_id: &str,
    patch: &CertificatePatch,
) -> Result<Certificate, DatabaseError> {
    let affected = conn.execute(
        "UPDATE certificates SET
             status = COALESCE(?2, status),
             url = COALESCE(?3, url),
             hash = COALESCE(?4, hash),
             issued_at = COALESCE(?5, issued_at),
             revoked_at = COALESCE(?6, revoked_at),
             verify_code = COALESCE(?7, verify_code),
             qr_payload = COALESCE(?8, qr_payload),
             updated_at = ?9
         WHERE certificate_id = ?1",
        params![
            certificate_id,
            patch.status.map(CertStatus::as_str),
            patch.url,
            patch.hash,
            patch.issued_at.map(|dt| dt.to_rfc3339()),
            patch.revoked_at.map(|dt| dt.to_rfc3339()),
            patch.verify_code,
            patch.qr_payload,
            Utc::now().to_rfc3339(),
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "certificate".into(),
            id: certificate_id.into(),
        });
    }
    get_certificate(conn, certificate_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "certificate".into(),
        id: certificate_id.into(),
    })
}

/// List certificates newest first, optionally scoped to one patient.
/// `page` is 1-indexed.
pub fn list_certificates(
    conn: &Connection,
    patient_id: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<Certificate>, i64), DatabaseError> {
    // Saturate: an absurd page number is an empty page, not an overflow.
    let offset = (page - 1).saturating_mul(limit);
    let mut stmt = conn.prepare(&format!(
        "SELECT {CERT_COLUMNS} FROM certificates
         WHERE (?1 IS NULL OR patient_id = ?1)
         ORDER BY created_at DESC
         LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(params![patient_id, limit, offset], row_to_certificate)?;
    let items = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM certificates WHERE (?1 IS NULL OR patient_id = ?1)",
        params![patient_id],
        |row| row.get(0),
    )?;
    Ok((items, total))
}

/// Unpaginated listing for a single patient, newest first.
pub fn list_by_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Certificate>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CERT_COLUMNS} FROM certificates
         WHERE patient_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id], row_to_certificate)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)
}

pub fn delete_certificate(conn: &Connection, certificate_id: &str) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM certificates WHERE certificate_id = ?1",
        params![certificate_id],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "certificate".into(),
            id: certificate_id.into(),
        });
    }
    Ok(())
}

fn row_to_certificate(row: &rusqlite::Row) -> Result<Certificate, rusqlite::Error> {
    let type_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let issued_str: Option<String> = row.get(4)?;
    let revoked_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(10)?;
    let updated_str: String = row.get(11)?;

    let cert_type = CertType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown certificate type '{type_str}'").into(),
        )
    })?;
    let status = CertStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown certificate status '{status_str}'").into(),
        )
    })?;

    Ok(Certificate {
        certificate_id: row.get(0)?,
        patient_id: row.get(1)?,
        cert_type,
        status,
        issued_at: issued_str.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        revoked_at: revoked_str.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        hash: row.get(6)?,
        url: row.get(7)?,
        verify_code: row.get(8)?,
        qr_payload: row.get(9)?,
        created_at: parse_dt(10, &created_str)?,
        updated_at: parse_dt(11, &updated_str)?,
    })
}
