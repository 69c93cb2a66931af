//! Patient directory endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::endpoints::auth::OkResponse;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, PageQuery};
use crate::auth::identity::Identity;
use crate::auth::policy::{authorize, require_role, RequiredRole};
use crate::db::repository::patient::{
    delete_patient, get_patient, insert_patient, list_patients, update_patient, PatientPatch,
};
use crate::models::patient::{Patient, Sex};

// page/limit are declared inline: serde_urlencoded cannot deserialize
// numeric fields through #[serde(flatten)].
#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub patient_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
}

/// `GET /patients?search=&page=&limit=` — staff only.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Patient>>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;
    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve()?;

    let conn = ctx.lock_db()?;
    let (items, total) = list_patients(&conn, query.search.as_deref(), page, limit)?;
    Ok(Json(Page {
        items,
        total,
        page,
        limit,
    }))
}

/// `GET /patients/:patientId` — staff, or the patient themself.
pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    authorize(Some(&identity), RequiredRole::Clinician, Some(&patient_id))?;

    let conn = ctx.lock_db()?;
    let patient = get_patient(&conn, &patient_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(patient))
}

/// `POST /patients` — staff only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;
    if body.patient_id.trim().is_empty() {
        return Err(ApiError::invalid_field("patientId", "must not be empty"));
    }
    if body.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "must not be empty"));
    }

    let now = Utc::now();
    let patient = Patient {
        patient_id: body.patient_id,
        name: body.name,
        phone: body.phone,
        date_of_birth: body.date_of_birth,
        sex: body.sex,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.lock_db()?;
    insert_patient(&conn, &patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `PUT /patients/:patientId` — staff only.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Patient>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let patch = PatientPatch {
        name: body.name,
        phone: body.phone,
        date_of_birth: body.date_of_birth,
        sex: body.sex,
    };
    let conn = ctx.lock_db()?;
    let patient = update_patient(&conn, &patient_id, &patch)?;
    Ok(Json(patient))
}

/// `DELETE /patients/:patientId` — staff only.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    require_role(Some(&identity), RequiredRole::Clinician)?;

    let conn = ctx.lock_db()?;
    delete_patient(&conn, &patient_id)?;
    Ok(Json(OkResponse { ok: true }))
}
