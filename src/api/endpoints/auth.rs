//! Authentication endpoints: staff registration and login, public
//! patient self-registration, session introspection, logout.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::middleware::auth::TOKEN_COOKIE;
use crate::api::types::ApiContext;
use crate::auth::identity::Identity;
use crate::auth::password::{hash_password, verify_password};
use crate::db::repository::user::{find_user_by_username, insert_patient_with_user, insert_user};
use crate::models::patient::{generate_patient_id, Patient, Sex};
use crate::models::user::{Role, User, UserSummary};

#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    /// Optional; defaults to clinician. Patient accounts are created
    /// only through self-registration.
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRegisterBody {
    pub username: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub sex: Option<Sex>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub username: String,
    pub role: Role,
    pub token: String,
}

#[derive(Serialize)]
pub struct PatientRegisterResponse {
    pub ok: bool,
    pub token: String,
    pub user: UserSummary,
    pub patient: Patient,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// `POST /auth/register` — staff account creation.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&body.username, &body.password)?;
    let role = body.role.unwrap_or(Role::Clinician);
    if role == Role::Patient {
        return Err(ApiError::invalid_field("role", "must be clinician or admin"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: body.username,
        password_hash: hash_password(&body.password, ctx.config.pbkdf2_iterations),
        role,
        linked_patient_id: None,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.lock_db()?;
    insert_user(&conn, &user)?;
    tracing::info!(username = %user.username, role = role.as_str(), "user registered");

    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

/// `POST /auth/login` — staff login surface.
///
/// Unknown usernames and wrong passwords produce the same error, so
/// the endpoint cannot be used for username enumeration.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = {
        let conn = ctx.lock_db()?;
        find_user_by_username(&conn, &body.username)?
    };
    let user = user.ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }
    if user.role == Role::Patient {
        // Patients hold the token issued at self-registration.
        return Err(ApiError::InvalidRole);
    }

    let token = ctx
        .signer
        .issue(&user.id.to_string(), &user.username, user.role, None);
    tracing::info!(username = %user.username, "login");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, ctx.config.token_ttl_secs),
        )],
        Json(LoginResponse {
            ok: true,
            username: user.username,
            role: user.role,
            token,
        }),
    ))
}

/// `POST /auth/register-patient` — public self-registration.
///
/// Creates the patient profile and the linked user account as one
/// transaction, then issues a token embedding the new patient id.
pub async fn register_patient(
    State(ctx): State<ApiContext>,
    Json(body): Json<PatientRegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&body.username, &body.password)?;
    if body.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "must not be empty"));
    }
    if let Some(phone) = &body.phone {
        if phone.len() < 5 {
            return Err(ApiError::invalid_field("phone", "too short"));
        }
    }
    let date_of_birth = match &body.dob {
        None => None,
        Some(s) => Some(
            parse_dob(s).ok_or_else(|| ApiError::invalid_field("dob", "must be an ISO date"))?,
        ),
    };

    let now = Utc::now();
    let patient = Patient {
        patient_id: generate_patient_id(),
        name: body.name,
        phone: body.phone,
        date_of_birth,
        sex: body.sex,
        created_at: now,
        updated_at: now,
    };
    let user = User {
        id: Uuid::new_v4(),
        username: body.username,
        password_hash: hash_password(&body.password, ctx.config.pbkdf2_iterations),
        role: Role::Patient,
        linked_patient_id: Some(patient.patient_id.clone()),
        created_at: now,
        updated_at: now,
    };

    {
        let mut conn = ctx.lock_db()?;
        insert_patient_with_user(&mut conn, &patient, &user)?;
    }
    tracing::info!(patient_id = %patient.patient_id, "patient self-registered");

    let token = ctx.signer.issue(
        &user.id.to_string(),
        &user.username,
        Role::Patient,
        Some(&patient.patient_id),
    );

    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            session_cookie(&token, ctx.config.token_ttl_secs),
        )],
        Json(PatientRegisterResponse {
            ok: true,
            token,
            user: UserSummary::from(&user),
            patient,
        }),
    ))
}

/// `GET /auth/me` — echo the verified identity.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// `POST /auth/logout` — clear the session cookie. Tokens are
/// stateless, so the credential itself stays valid until expiry.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(OkResponse { ok: true }),
    )
}

fn session_cookie(token: &str, max_age: u64) -> String {
    format!("{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}")
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.len() < 3 {
        return Err(ApiError::invalid_field("username", "at least 3 characters"));
    }
    if password.len() < 6 {
        return Err(ApiError::invalid_field("password", "at least 6 characters"));
    }
    Ok(())
}

fn parse_dob(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
