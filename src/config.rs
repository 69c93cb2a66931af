use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "medcert";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default token lifetime: 1 day.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "medcert=info,tower_http=info".to_string()
}

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// SQLite database file path.
    pub db_path: PathBuf,
    /// HMAC secret for identity tokens.
    pub token_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Public base URL embedded in certificate QR payloads.
    pub public_base_url: String,
    /// PBKDF2 iteration count for password hashing.
    pub pbkdf2_iterations: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 4000)));

        let db_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("medcert.db"));

        let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("TOKEN_SECRET not set, using development secret");
            "dev-secret".to_string()
        });

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", bind_addr.port()));

        let pbkdf2_iterations = env::var("PBKDF2_ITERATIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::auth::password::DEFAULT_ITERATIONS);

        Self {
            bind_addr,
            db_path,
            token_secret,
            token_ttl_secs,
            public_base_url,
            pbkdf2_iterations,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            db_path: PathBuf::from("medcert.db"),
            token_secret: "dev-secret".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            public_base_url: "http://localhost:4000".to_string(),
            pbkdf2_iterations: crate::auth::password::DEFAULT_ITERATIONS,
        }
    }
}
