mod api_doc;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use config::Config;
use db::Db;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("veterinaria-api starting");

    let config = Config::from_env()?;
    config.log_startup();

    // Connect the pool and provision the table before accepting traffic.
    // A failure here exits the process so the supervisor can restart it.
    let db = Db::from_config(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.service_host, config.service_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid SERVICE_HOST/SERVICE_PORT: {e}"))?;

    let app = routes::router(AppState {
        db: db.clone(),
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Paired with the connect in Db::from_config; runs even when serving
    // ended with an error.
    db.close().await;
    tracing::info!("veterinaria-api stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
