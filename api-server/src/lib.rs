//! Long-running HTTP server for the virtual try-on product.
//!
//! # Routes
//! - `POST /auth/signup`, `POST /auth/login` - bcrypt accounts and JWT sessions
//! - `GET|POST /api/todos` - demo record API
//! - `POST /api/upload` - multipart upload, files served back under `/uploads`
//! - `POST /api/generate-tryon` - photo + prompt relayed to the generation provider
//! - `GET /health`
//!
//! # Configuration
//! `PORT` (5000), `DATABASE_URL`, `JWT_SECRET`, `UPLOAD_DIR` (`uploads`),
//! `TRYON_REQUIRE_AUTH` (`false`) and the provider variables read by
//! [`shared::ProviderConfig`].
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::info;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::ServerConfig;
use routes::{
    create_todo_handler, generate_handler, health_handler, list_todos_handler, login_handler,
    signup_handler, upload_handler,
};
use state::State;

/// Base64 photos are large; match the 50 MB ceiling clients expect.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/api/todos", get(list_todos_handler).post(create_todo_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/generate-tryon", post(generate_handler))
        .route("/health", get(health_handler))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = ServerConfig::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
