//! Certificate lifecycle endpoints.
//!
//! Certificates are created as DRAFT with an eagerly generated verify
//! code, move forward through SIGNED to REVOKED, and never move back.
//! Timestamps are stamped exactly once at the transition that makes
//! them meaningful.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::endpoints::auth::OkResponse;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, PageQuery};
use crate::auth::identity::Identity;
use crate::auth::policy::{authorize, require_role, RequiredRole};
use crate::db::repository::certificate::{
    delete_certificate, get_certificate, insert_certificate, list_by_patient, list_certificates,
    update_certificate, CertificatePatch,
};
use crate::db::repository::patient::patient_exists;
use crate::db::DatabaseError;
use crate::models::certificate::{CertStatus, CertType, Certificate};
use crate::verifycode::{build_verify_url, generate_verify_code};

/// Attempts before giving up on verify-code generation. The space is
/// 32^8, so a second collision in a row already means something is
/// wrong with the RNG.
const CODE_RETRIES: usize = 5;

// page/limit are declared inline: serde_urlencoded cannot deserialize
// numeric fields through #[serde(flatten)].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub patient_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub certificate_id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub cert_type: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub status: Option<String>,
    pub url: Option<String>,
    pub hash: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// `GET /certificates?patientId=&page=&limit=` — staff see everything;
/// a patient must scope the listing to their own id, since an unscoped
/// listing cannot be ownership-checked.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Certificate>>, ApiError> {
    match query.patient_id.as_deref() {
        Some(patient_id) => authorize(Some(&identity), RequiredRole::Clinician, Some(patient_id))?,
        None => require_role(Some(&identity), RequiredRole::Clinician)?,
    }
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve()?;

    let conn = ctx.lock_db()?;
    let (items, total) = list_certificates(&conn, query.patient_id.as_deref(), page, limit)?;
    Ok(Json(Page {
        items,
        total,
        page,
        limit,
    }))
}

/// `GET /certificates/by-patient/:patientId` — unpaginated alias.
pub async fn by_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    authorize(Some(&identity), RequiredRole::Clinician, Some(&patient_id))?;

    let conn = ctx.lock_db()?;
    let items = list_by_patient(&conn, &patient_id)?;
    Ok(Json(items))
}

/// `GET /certificates/:certificateId` — staff, or the owning patient.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(certificate_id): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    let conn = ctx.lock_db()?;
    let cert = get_certificate(&conn, &certificate_id)?.ok_or(ApiError::NotFound)?;
    authorize(
        Some(&identity),
        RequiredRole::Clinician,
        Some(&cert.patient_id),
    )?;
    Ok(Json(cert))
}

/// `POST /certificates` — staff only. The verify code is assigned here,
/// at creation, with a regenerate-and-retry loop against the unique
/// index in the unlikely event of a collision.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;
    if body.certificate_id.trim().is_empty() {
        return Err(ApiError::invalid_field(
            "certificateId",
            "must not be empty",
        ));
    }
    let cert_type = CertType::parse(&body.cert_type)
        .ok_or_else(|| ApiError::invalid_field("type", "unknown certificate type"))?;

    let conn = ctx.lock_db()?;
    if !patient_exists(&conn, &body.patient_id)? {
        return Err(ApiError::PatientNotFound);
    }

    let now = Utc::now();
    let mut cert = Certificate {
        certificate_id: body.certificate_id,
        patient_id: body.patient_id,
        cert_type,
        status: CertStatus::Draft,
        issued_at: None,
        revoked_at: None,
        hash: None,
        url: None,
        verify_code: None,
        qr_payload: None,
        created_at: now,
        updated_at: now,
    };

    assign_code_and_insert(
        &conn,
        &mut cert,
        &ctx.config.public_base_url,
        generate_verify_code,
    )?;
    tracing::info!(
        certificate_id = %cert.certificate_id,
        patient_id = %cert.patient_id,
        "certificate created"
    );

    Ok((StatusCode::CREATED, Json(cert)))
}

/// `PUT /certificates/:certificateId` — staff only.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(certificate_id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Certificate>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let conn = ctx.lock_db()?;
    let existing = get_certificate(&conn, &certificate_id)?.ok_or(ApiError::NotFound)?;

    let mut patch = resolve_transition(&existing, &body, Utc::now())?;
    if patch.verify_code.is_some() {
        patch.qr_payload = patch
            .verify_code
            .as_deref()
            .map(|code| build_verify_url(&ctx.config.public_base_url, code));
    }

    let cert = update_certificate(&conn, &certificate_id, &patch)?;
    Ok(Json(cert))
}

/// `DELETE /certificates/:certificateId` — staff only; hard delete.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(certificate_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let conn = ctx.lock_db()?;
    delete_certificate(&conn, &certificate_id)?;
    tracing::info!(certificate_id = %certificate_id, "certificate deleted");
    Ok(Json(OkResponse { ok: true }))
}

/// Assign a fresh verify code and insert, regenerating on a code
/// collision up to the retry budget. A client-supplied duplicate
/// (`certificate_id`) still surfaces as `Duplicate`; running out of
/// retries is a server-side generation failure and maps to a 500, since
/// the caller sent nothing wrong.
fn assign_code_and_insert(
    conn: &rusqlite::Connection,
    cert: &mut Certificate,
    public_base_url: &str,
    mut next_code: impl FnMut() -> String,
) -> Result<(), ApiError> {
    for _ in 0..=CODE_RETRIES {
        let code = next_code();
        cert.qr_payload = Some(build_verify_url(public_base_url, &code));
        cert.verify_code = Some(code);

        match insert_certificate(conn, cert) {
            Ok(()) => return Ok(()),
            Err(DatabaseError::Duplicate { ref field, .. }) if field == "verify_code" => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(ApiError::Internal(
        "verify code generation kept colliding".into(),
    ))
}

/// Turn an update request into a persistable patch, enforcing the
/// forward-only lifecycle:
///
/// - a requested status with lower rank than the stored one is rejected;
/// - moving into SIGNED stamps `issued_at` now unless the request or
///   the stored row already carries one; REVOKED and `revoked_at`
///   behave the same way;
/// - signing a certificate that somehow has no verify code assigns one
///   as part of the same update.
fn resolve_transition(
    existing: &Certificate,
    body: &UpdateBody,
    now: DateTime<Utc>,
) -> Result<CertificatePatch, ApiError> {
    let mut patch = CertificatePatch {
        url: body.url.clone(),
        hash: body.hash.clone(),
        issued_at: body.issued_at,
        revoked_at: body.revoked_at,
        ..Default::default()
    };

    let status = match &body.status {
        None => return Ok(patch),
        Some(s) => CertStatus::parse(s)
            .ok_or_else(|| ApiError::invalid_field("status", "unknown status"))?,
    };
    if status.rank() < existing.status.rank() {
        return Err(ApiError::invalid_field(
            "status",
            &format!(
                "cannot move from {} back to {}",
                existing.status.as_str(),
                status.as_str()
            ),
        ));
    }
    patch.status = Some(status);

    if status == CertStatus::Signed && existing.status != CertStatus::Signed {
        if patch.issued_at.is_none() && existing.issued_at.is_none() {
            patch.issued_at = Some(now);
        }
        if existing.verify_code.is_none() {
            patch.verify_code = Some(generate_verify_code());
        }
    }
    if status == CertStatus::Revoked
        && existing.status != CertStatus::Revoked
        && patch.revoked_at.is_none()
        && existing.revoked_at.is_none()
    {
        patch.revoked_at = Some(now);
    }

    Ok(patch)
}
