use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eventboard::config::ServerConfig;
use eventboard::web::AppState;
use eventboard::{bootstrap, db, templates, web};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(bind_addr = %config.bind_addr, "starting eventboard");

    let db = db::connect(&config.database_url).await?;
    db::ensure_schema(&db).await?;
    bootstrap::ensure_admin_user(&db, &config).await?;

    tokio::fs::create_dir_all(&config.media_root).await?;

    let state = AppState {
        db,
        config: Arc::new(config.clone()),
        templates: templates::build()?,
    };
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
