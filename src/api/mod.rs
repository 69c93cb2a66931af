//! HTTP API.
//!
//! Routes are protected by a middleware stack that authenticates the
//! bearer credential (cookie or Authorization header) and injects the
//! caller's `Identity`; per-route authorization happens in handlers via
//! the policy module. The router is composable — `api_router()` returns
//! a `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::ApiServer;
pub use types::ApiContext;
