// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hearu_backend::config::Config;
use hearu_backend::routes;
use hearu_backend::services::chat_store::{ChatMessageStore, MemoryChatStore, RedisChatStore};
use hearu_backend::services::media::{LocalMediaStore, MediaStore};
use hearu_backend::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // External collaborators, constructed once and injected — never
    // reached for as ambient globals.
    let chat_store: Arc<dyn ChatMessageStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisChatStore::connect(url)
                .await
                .expect("Failed to connect to Redis chat store"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set; using in-memory chat store");
            Arc::new(MemoryChatStore::new())
        }
    };

    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(
        config.media_root.clone(),
        config.public_base_url.clone(),
    ));

    // Create AppState
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        chat_store,
        media,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Hear-U listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Drain the pool so in-flight transactions resolve before exit.
    pool.close().await;
    tracing::info!("Shutdown complete.");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
