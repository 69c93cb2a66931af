//! Clinical record endpoints.
//!
//! Reads are allowed to staff or the owning patient; writes are staff
//! only. Payloads are validated by the record-type registry — on create
//! against the submitted type, on update against the stored type, since
//! a record's type never changes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::api::endpoints::auth::OkResponse;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, PageQuery};
use crate::auth::identity::Identity;
use crate::auth::policy::{authorize, require_role, RequiredRole};
use crate::db::repository::record::{
    get_record, insert_record, list_records, soft_delete_record, update_record, RecordFilter,
    RecordPatch,
};
use crate::db::repository::patient::patient_exists;
use crate::models::record::{ClinicalRecord, CreatedBy, RecordType};

// page/limit are declared inline: serde_urlencoded cannot deserialize
// numeric fields through #[serde(flatten)].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub patient_id: String,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub tag: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub record_id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub payload: Value,
    pub tags: Option<Vec<String>>,
    pub effective_at: Option<DateTime<Utc>>,
    pub fhir_ref: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub payload: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub effective_at: Option<DateTime<Utc>>,
}

/// `GET /records?patientId=&type=&tag=&from=&to=&page=&limit=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ClinicalRecord>>, ApiError> {
    authorize(
        Some(&identity),
        RequiredRole::Clinician,
        Some(&query.patient_id),
    )?;
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve()?;

    let record_type = match &query.record_type {
        None => None,
        Some(s) => Some(
            RecordType::parse(s)
                .ok_or_else(|| ApiError::invalid_field("type", "unknown record type"))?,
        ),
    };
    let filter = RecordFilter {
        record_type,
        tag: query.tag,
        from: query.from,
        to: query.to,
    };

    let conn = ctx.lock_db()?;
    let (items, total) = list_records(&conn, &query.patient_id, &filter, page, limit)?;
    Ok(Json(Page {
        items,
        total,
        page,
        limit,
    }))
}

/// `GET /records/:recordId` — staff, or the patient the record belongs to.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(record_id): Path<String>,
) -> Result<Json<ClinicalRecord>, ApiError> {
    let conn = ctx.lock_db()?;
    let record = get_record(&conn, &record_id)?.ok_or(ApiError::NotFound)?;
    authorize(
        Some(&identity),
        RequiredRole::Clinician,
        Some(&record.patient_id),
    )?;
    Ok(Json(record))
}

/// `POST /records` — staff only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;
    if body.record_id.trim().is_empty() {
        return Err(ApiError::invalid_field("recordId", "must not be empty"));
    }

    // Reject unknown types before touching the payload
    let record_type = RecordType::parse(&body.record_type)
        .ok_or_else(|| ApiError::invalid_field("type", "unknown record type"))?;

    let conn = ctx.lock_db()?;
    if !patient_exists(&conn, &body.patient_id)? {
        return Err(ApiError::PatientNotFound);
    }
    let payload = ctx.registry.validate(record_type, &body.payload)?;

    let now = Utc::now();
    let record = ClinicalRecord {
        record_id: body.record_id,
        patient_id: body.patient_id,
        record_type,
        payload,
        created_by: CreatedBy {
            user_id: identity.id().to_string(),
            username: identity.username().to_string(),
            role: identity.role(),
        },
        tags: body.tags.unwrap_or_default(),
        effective_at: body.effective_at,
        fhir_ref: body.fhir_ref,
        revision: 1,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    insert_record(&conn, &record)?;
    tracing::info!(
        record_id = %record.record_id,
        patient_id = %record.patient_id,
        record_type = record_type.as_str(),
        "record created"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /records/:recordId` — staff only. A payload, when present, is
/// validated against the type the record was created with.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(record_id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<ClinicalRecord>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let conn = ctx.lock_db()?;
    let payload = match body.payload {
        None => None,
        Some(raw) => {
            let existing = get_record(&conn, &record_id)?.ok_or(ApiError::NotFound)?;
            Some(ctx.registry.validate(existing.record_type, &raw)?)
        }
    };

    let patch = RecordPatch {
        payload,
        tags: body.tags,
        effective_at: body.effective_at,
    };
    let record = update_record(&conn, &record_id, &patch)?;
    Ok(Json(record))
}

/// `DELETE /records/:recordId` — staff only; soft delete.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(record_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let conn = ctx.lock_db()?;
    soft_delete_record(&conn, &record_id)?;
    tracing::info!(record_id = %record_id, "record soft-deleted");
    Ok(Json(OkResponse { ok: true }))
}
