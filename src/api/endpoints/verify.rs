//! Public certificate verification. Unauthenticated by design: the
//! verify code is the capability, and the response exposes no PHI
//! beyond a masked patient id.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::certificate::find_by_verify_code;
use crate::models::certificate::{CertStatus, CertType};
use crate::verifycode::mask_patient_id;

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    pub certificate_id: String,
    #[serde(rename = "type")]
    pub cert_type: CertType,
    pub status: CertStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub patient: String,
}

#[derive(Serialize)]
struct NoMatch {
    valid: bool,
}

/// `GET /verify?code=XXXX-XXXX`
///
/// An unknown code answers 404 with `{valid: false}` rather than the
/// error envelope; a known code answers 200 whatever its status, with
/// `valid` true only for SIGNED.
pub async fn verify(
    State(ctx): State<ApiContext>,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let code = query.code.as_deref().map(str::trim).unwrap_or("");
    if code.is_empty() {
        return Err(ApiError::MissingCode);
    }

    let cert = {
        let conn = ctx.lock_db()?;
        find_by_verify_code(&conn, code)?
    };
    let cert = match cert {
        Some(cert) => cert,
        None => {
            return Ok(
                (StatusCode::NOT_FOUND, Json(NoMatch { valid: false })).into_response()
            )
        }
    };

    Ok(Json(VerifyResponse {
        valid: cert.status == CertStatus::Signed,
        certificate_id: cert.certificate_id,
        cert_type: cert.cert_type,
        status: cert.status,
        issued_at: cert.issued_at,
        revoked_at: cert.revoked_at,
        patient: mask_patient_id(&cert.patient_id),
    })
    .into_response())
}
