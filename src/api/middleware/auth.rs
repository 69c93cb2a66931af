//! Credential-extraction middleware.
//!
//! Pulls the bearer credential from the `token` cookie or the
//! `Authorization: Bearer` header (cookie takes precedence), verifies
//! signature and expiry, and injects the caller's `Identity` into
//! request extensions for downstream handlers. Any absence,
//! malformation, or expiry is a 401.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::identity::Identity;

/// Cookie name carrying the identity token.
pub const TOKEN_COOKIE: &str = "token";

/// Require a verified identity on the request.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = extract_token(&req).ok_or(ApiError::Unauthorized)?;
    let claims = ctx.signer.verify(&token)?;
    let identity = Identity::from_claims(&claims).ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn extract_token(req: &Request<axum::body::Body>) -> Option<String> {
    // Prefer cookie; fall back to Authorization header
    if let Some(token) = cookie_value(req, TOKEN_COOKIE) {
        return Some(token);
    }
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_value(req: &Request<axum::body::Body>, name: &str) -> Option<String> {
    let header = req.headers().get("Cookie")?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
