use std::net::SocketAddr;

use anyhow::Context;
use fundflow::config::AppConfig;
use fundflow::{db, routes, AppState};
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let docs = db::connect_documents(&config.mongodb_url, &config.mongodb_database)
        .await
        .context("Failed to configure MongoDB client")?;
    db::ensure_indexes(&docs)
        .await
        .context("Failed to create MongoDB indexes")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .context("Failed to create upload directory")?;

    let host: std::net::IpAddr = config
        .host
        .parse()
        .context("BACKEND_HOST is not an IP address")?;
    let addr = SocketAddr::new(host, config.port);

    let state = AppState {
        db: pool,
        docs,
        http: reqwest::Client::new(),
        config,
    };
    let app = routes::router(state);

    tracing::info!(host = %addr, "Starting fundflow API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
