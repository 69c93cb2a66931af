//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::auth::token::TokenSigner;
use crate::config::AppConfig;
use crate::registry::RecordTypeRegistry;

/// Maximum page size for any listing endpoint.
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Default page size when the query omits `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Shared context for all routes and middleware. The connection is
/// process-wide; requests serialize on it for the duration of their
/// store interaction.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<AppConfig>,
    pub signer: TokenSigner,
    pub registry: Arc<RecordTypeRegistry>,
}

impl ApiContext {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let signer = TokenSigner::new(&config.token_secret, config.token_ttl_secs);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            signer,
            registry: Arc::new(RecordTypeRegistry::standard()),
        }
    }

    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

/// Offset-based pagination query, 1-indexed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to concrete (page, limit), rejecting out-of-range values.
    pub fn resolve(self) -> Result<(i64, i64), ApiError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::invalid_field("page", "must be >= 1"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ApiError::invalid_field(
                "limit",
                &format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }
        Ok((page, limit))
    }
}

/// Paginated response envelope: `{items, total, page, limit}`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
