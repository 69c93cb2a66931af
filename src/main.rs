use tracing_subscriber::EnvFilter;

use medcert::api::server::ApiServer;
use medcert::api::types::ApiContext;
use medcert::config::{self, AppConfig};
use medcert::db::sqlite::open_database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        version = config::APP_VERSION,
        db = %config.db_path.display(),
        "starting {}",
        config::APP_NAME
    );

    let conn = open_database(&config.db_path)?;
    let bind_addr = config.bind_addr;
    let ctx = ApiContext::new(conn, config);

    let mut server = ApiServer::start(ctx, bind_addr).await?;
    tracing::info!(addr = %server.addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown();

    Ok(())
}
