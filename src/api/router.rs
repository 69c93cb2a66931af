//! HTTP router.
//!
//! Two route groups: open routes (health, registration, login, public
//! certificate verification) and protected routes behind the auth
//! middleware. Handlers use `State<ApiContext>`; the middleware reads
//! the same context from an `Extension` layer, which therefore must be
//! outermost.

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full application router.
pub fn api_router(ctx: ApiContext) -> Router {
    let open = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route(
            "/auth/register-patient",
            post(endpoints::auth::register_patient),
        )
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/verify", get(endpoints::verify::verify))
        .with_state(ctx.clone());

    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:patient_id",
            get(endpoints::patients::get)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/records",
            get(endpoints::records::list).post(endpoints::records::create),
        )
        .route(
            "/records/:record_id",
            get(endpoints::records::get)
                .put(endpoints::records::update)
                .delete(endpoints::records::delete),
        )
        .route(
            "/certificates",
            get(endpoints::certificates::list).post(endpoints::certificates::create),
        )
        .route(
            "/certificates/by-patient/:patient_id",
            get(endpoints::certificates::by_patient),
        )
        .route(
            "/certificates/:certificate_id",
            get(endpoints::certificates::get)
                .put(endpoints::certificates::update)
                .delete(endpoints::certificates::delete),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so the middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new()
        .merge(open)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::db::sqlite::open_memory_database;

    fn test_app() -> Router {
        let conn = open_memory_database().unwrap();
        let config = AppConfig {
            token_secret: "test-secret".into(),
            // keep test startup fast; production default is much higher
            pbkdf2_iterations: 1_000,
            ..AppConfig::default()
        };
        api_router(ApiContext::new(conn, config))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a staff user and log in; returns the session token.
    async fn staff_token(app: &Router, username: &str, role: &str) -> String {
        let (status, _) = send(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"username": username, "password": "hunter22", "role": role})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": username, "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Self-register a patient; returns (token, patient_id).
    async fn patient_session(app: &Router, username: &str) -> (String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/register-patient",
            None,
            Some(json!({"username": username, "password": "hunter22", "name": "Jane Doe"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["token"].as_str().unwrap().to_string(),
            body["patient"]["patientId"].as_str().unwrap().to_string(),
        )
    }

    /// A payload passing the vitals validator.
    fn vitals(heart_rate: i64) -> Value {
        json!({
            "heartRate": heart_rate, "systolic": 120, "diastolic": 80,
            "tempC": 36.6, "spo2": 98
        })
    }

    async fn create_patient(app: &Router, token: &str, patient_id: &str) {
        let (status, _) = send(
            app,
            Method::POST,
            "/patients",
            Some(token),
            Some(json!({"patientId": patient_id, "name": "Test Patient"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], "medcert");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = test_app();
        for uri in ["/auth/me", "/patients", "/records?patientId=P-1", "/certificates"] {
            let (status, body) = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "Unauthorized", "{uri}");
        }

        let (status, _) = send(&app, Method::GET, "/auth/me", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_round_trips_the_role() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "admin").await;

        let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
        assert_eq!(body["username"], "dr.adams");
    }

    #[tokio::test]
    async fn register_rejects_patient_role_and_duplicates() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"username": "mallory", "password": "hunter22", "role": "patient"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let _ = staff_token(&app, "dr.adams", "clinician").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"username": "dr.adams", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "UsernameTaken");
    }

    #[tokio::test]
    async fn login_failure_is_indistinguishable() {
        let app = test_app();
        let _ = staff_token(&app, "dr.adams", "clinician").await;

        let (status_unknown, body_unknown) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "nobody", "password": "hunter22"})),
        )
        .await;
        let (status_wrong, body_wrong) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "dr.adams", "password": "wrong-password"})),
        )
        .await;

        assert_eq!(status_unknown, StatusCode::BAD_REQUEST);
        assert_eq!(status_unknown, status_wrong);
        assert_eq!(body_unknown, body_wrong);
        assert_eq!(body_unknown["error"], "InvalidCredentials");
    }

    #[tokio::test]
    async fn staff_login_rejects_patient_accounts() {
        let app = test_app();
        let _ = patient_session(&app, "jane").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "jane", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "InvalidRole");
    }

    #[tokio::test]
    async fn patient_registration_is_atomic_on_username_conflict() {
        let app = test_app();
        let clinician = staff_token(&app, "dr.adams", "clinician").await;
        let _ = patient_session(&app, "jane").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register-patient",
            None,
            Some(json!({"username": "jane", "password": "hunter22", "name": "Impostor"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "UsernameTaken");

        // The failed registration must not leave an orphan profile behind
        let (status, body) = send(&app, Method::GET, "/patients", Some(&clinician), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn patient_token_carries_linkage() {
        let app = test_app();
        let (token, patient_id) = patient_session(&app, "jane").await;

        let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "patient");
        assert_eq!(body["linkedPatientId"], patient_id.as_str());
    }

    #[tokio::test]
    async fn record_payloads_are_validated_per_type() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-25AB12CD").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-25AB12CD", "type": "vitals",
                "payload": vitals(400)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
        assert!(body["details"]["fieldErrors"]["heartRate"].is_array());

        let (status, body) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-25AB12CD", "type": "vitals",
                "payload": vitals(80)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["revision"], 1);
        assert_eq!(body["createdBy"]["username"], "dr.adams");
    }

    #[tokio::test]
    async fn record_create_requires_known_patient_and_type() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-MISSING", "type": "vitals",
                "payload": {}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PatientNotFound");

        create_patient(&app, &token, "P-1").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-1", "type": "horoscope",
                "payload": {}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn record_update_bumps_revision_and_checks_stored_type() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-1").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-1", "type": "vitals",
                "payload": vitals(80)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // A visitNote payload is invalid for a vitals record
        let (status, body) = send(
            &app,
            Method::PUT,
            "/records/R-1",
            Some(&token),
            Some(json!({"payload": {"chiefComplaint": "cough"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/records/R-1",
            Some(&token),
            Some(json!({"payload": vitals(90)})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["revision"], 2);
        assert_eq!(body["payload"]["heartRate"], 90);
    }

    #[tokio::test]
    async fn soft_deleted_records_disappear() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-1").await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": "P-1", "type": "vitals",
                "payload": vitals(80)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::DELETE, "/records/R-1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let (status, _) = send(&app, Method::GET, "/records/R-1", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, "/records/R-1", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::GET,
            "/records?patientId=P-1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn patients_cannot_read_other_patients_data() {
        let app = test_app();
        let (jane_token, jane_id) = patient_session(&app, "jane").await;
        let (_, bob_id) = patient_session(&app, "bob").await;

        // foreign records listing: 403, not 401
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/records?patientId={bob_id}"),
            Some(&jane_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");

        // own records listing is fine
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/records?patientId={jane_id}"),
            Some(&jane_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // foreign profile: 403; own profile: 200
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/patients/{bob_id}"),
            Some(&jane_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/patients/{jane_id}"),
            Some(&jane_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // the patient directory is staff only
        let (status, _) = send(&app, Method::GET, "/patients", Some(&jane_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn patients_cannot_write_records() {
        let app = test_app();
        let (token, patient_id) = patient_session(&app, "jane").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-1", "patientId": patient_id, "type": "vitals",
                "payload": vitals(80)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn certificate_lifecycle_and_public_verification() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-25AB12CD").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/certificates",
            Some(&token),
            Some(json!({
                "certificateId": "CERT-1", "patientId": "P-25AB12CD",
                "type": "DrivingLicenceMedical"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "DRAFT");
        let code = body["verifyCode"].as_str().unwrap().to_string();
        assert_eq!(code.len(), 9);
        assert!(body["qrPayload"].as_str().unwrap().contains("/verify?code="));

        // a draft verifies as not-valid but still resolves
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/verify?code={code}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["status"], "DRAFT");

        // sign, then verify again
        let (status, body) = send(
            &app,
            Method::PUT,
            "/certificates/CERT-1",
            Some(&token),
            Some(json!({"status": "SIGNED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SIGNED");
        let issued_at = body["issuedAt"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/verify?code={code}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["certificateId"], "CERT-1");
        assert_eq!(body["patient"], "*******2CD");

        // signing again does not re-stamp issuedAt
        let (status, body) = send(
            &app,
            Method::PUT,
            "/certificates/CERT-1",
            Some(&token),
            Some(json!({"status": "SIGNED", "hash": "abc123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["issuedAt"], issued_at.as_str());

        // backward transition is rejected
        let (status, body) = send(
            &app,
            Method::PUT,
            "/certificates/CERT-1",
            Some(&token),
            Some(json!({"status": "DRAFT"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        // revoke; verification flips back to not-valid
        let (status, body) = send(
            &app,
            Method::PUT,
            "/certificates/CERT-1",
            Some(&token),
            Some(json!({"status": "REVOKED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["revokedAt"].is_string());

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/verify?code={code}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["status"], "REVOKED");
    }

    #[tokio::test]
    async fn verify_handles_missing_and_unknown_codes() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/verify", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "MissingCode");

        let (status, body) = send(&app, Method::GET, "/verify?code=%20%20", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "MissingCode");

        let (status, body) = send(
            &app,
            Method::GET,
            "/verify?code=ZZZZ-ZZZZ",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"valid": false}));
    }

    #[tokio::test]
    async fn patients_must_scope_certificate_listings_to_themselves() {
        let app = test_app();
        let (token, patient_id) = patient_session(&app, "jane").await;

        // unscoped listing cannot be ownership-checked
        let (status, _) = send(&app, Method::GET, "/certificates", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/certificates?patientId={patient_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/certificates/by-patient/{patient_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_ids_are_reported() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-1").await;

        let record = json!({
            "recordId": "R-1", "patientId": "P-1", "type": "vitals",
            "payload": vitals(80)
        });
        let (status, _) = send(&app, Method::POST, "/records", Some(&token), Some(record.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, Method::POST, "/records", Some(&token), Some(record)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Duplicate");

        let (status, body) = send(
            &app,
            Method::POST,
            "/patients",
            Some(&token),
            Some(json!({"patientId": "P-1", "name": "Again"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Duplicate");
    }

    #[tokio::test]
    async fn record_list_filters_by_type_and_paginates() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-1").await;

        for i in 0..3 {
            let (status, _) = send(
                &app,
                Method::POST,
                "/records",
                Some(&token),
                Some(json!({
                    "recordId": format!("R-{i}"), "patientId": "P-1", "type": "vitals",
                    "payload": vitals(80)
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({
                "recordId": "R-allergy", "patientId": "P-1", "type": "allergy",
                "payload": {"substance": "penicillin", "severity": "severe"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::GET,
            "/records?patientId=P-1&type=allergy",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["recordId"], "R-allergy");

        let (status, body) = send(
            &app,
            Method::GET,
            "/records?patientId=P-1&page=2&limit=3",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["page"], 2);

        let (status, body) = send(
            &app,
            Method::GET,
            "/records?patientId=P-1&limit=500",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn absurd_page_numbers_yield_an_empty_page() {
        let app = test_app();
        let token = staff_token(&app, "dr.adams", "clinician").await;
        create_patient(&app, &token, "P-1").await;

        let uri = format!("/records?patientId=P-1&page={}&limit=100", i64::MAX);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));

        let uri = format!("/patients?page={}&limit=100", i64::MAX);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));

        let uri = format!("/certificates?page={}&limit=100", i64::MAX);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let app = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("Max-Age=0"));
    }
}
