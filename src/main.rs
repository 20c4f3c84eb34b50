//! paygate - payment submission backend API
//!
//! Email/password accounts, access/refresh bearer tokens and a payment
//! endpoint that rejects retries of the same payment inside a one-minute
//! window.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygate::api::{self, AppState};
use paygate::credentials::CredentialStore;
use paygate::db;
use paygate::domain::{Clock, SystemClock};
use paygate::gateway::SimulatedProcessor;
use paygate::store::{PgAccountStore, PgTransactionStore};
use paygate::tokens::TokenAuthority;
use paygate::{Config, LogFormat};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "paygate=debug,tower_http=debug".into()),
    );

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Build the application router
fn build_router(state: AppState, config: &Config) -> Router {
    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api/v1", api::create_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(config.request_timeout)),
        );

    if config.is_production() {
        app
    } else {
        app.layer(CorsLayer::permissive())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Starting paygate server");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let tokens = TokenAuthority::new(
        config.access_token_secret.as_bytes(),
        config.refresh_token_secret.as_bytes(),
        clock.clone(),
    )?
    .with_ttls(
        chrono::Duration::minutes(config.access_token_ttl_minutes),
        chrono::Duration::minutes(config.refresh_token_ttl_minutes),
    );

    let state = AppState::new(
        Arc::new(PgAccountStore::new(pool.clone())),
        Arc::new(PgTransactionStore::new(pool.clone())),
        CredentialStore::default(),
        Arc::new(tokens),
        Arc::new(SimulatedProcessor::new(config.payment_processing_delay)),
        clock,
    );

    let app = build_router(state, &config);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
