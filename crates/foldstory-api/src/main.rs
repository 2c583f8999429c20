//! Foldstory API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use foldstory_api::error::AppError;
use foldstory_api::routes;
use foldstory_api::state::AppState;
use foldstory_core::clock::SystemClock;
use foldstory_core::tokens::{RandomTokens, TokenSource};
use foldstory_session::domain::policy::EnginePolicy;
use foldstory_store::MemorySessionRepository;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Foldstory API server");

    // Read configuration from environment.
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
    let policy: EnginePolicy = match std::env::var("FOLDSTORY_POLICY") {
        Ok(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("FOLDSTORY_POLICY must be valid JSON: {e}")))?,
        Err(_) => EnginePolicy::default(),
    };

    // Build application state.
    let tokens: Arc<Mutex<dyn TokenSource + Send>> = Arc::new(Mutex::new(RandomTokens));
    let app_state = AppState::new(
        Arc::new(MemorySessionRepository::new()),
        Arc::new(SystemClock),
        tokens,
        Arc::new(policy),
    );

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::sessions::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
