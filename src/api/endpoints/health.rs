//! Liveness check.

use axum::Json;
use serde::Serialize;

use crate::config;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub ts: String,
}

/// `GET /health`
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: config::APP_NAME,
        ts: chrono::Utc::now().to_rfc3339(),
    })
}
