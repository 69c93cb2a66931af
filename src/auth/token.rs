//! Signed identity tokens.
//!
//! A token is `base64url(claims_json) . base64url(hmac_sha256(payload))`.
//! Stateless and time-bounded; there is no revocation list — logout is a
//! client-side cookie clear and a token stays valid until expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::models::user::Role;

type HmacSha256 = Hmac<Sha256>;

/// Decoded, verified token contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_patient_id: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Issues and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    /// Issue a token for the given subject, expiring after the
    /// configured lifetime.
    pub fn issue(
        &self,
        sub: &str,
        username: &str,
        role: Role,
        linked_patient_id: Option<&str>,
    ) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            role,
            linked_patient_id: linked_patient_id.map(str::to_string),
            exp: Utc::now().timestamp() + self.ttl_secs as i64,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> String {
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
        let sig = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes()));
        format!("{payload}.{sig}")
    }

    /// Verify signature and expiry. Fails closed on any malformation.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, sig) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let provided = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;
        let expected = self.mac(payload.as_bytes());
        if !bool::from(provided.ct_eq(&expected)) {
            return Err(TokenError::BadSignature);
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}
