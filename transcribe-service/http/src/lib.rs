use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use transcribe_configuration::ServerConfig;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{error_mapper, HttpError};
pub use handlers::*;
pub use state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    // Uploads are whole audio files; the default 2 MiB limit is far too small.
    let transcribe_route = post(transcribe_audio).layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/transcribe", transcribe_route)
        .fallback(serve_frontend)
        .with_state(state)
}

pub async fn create_app_routes(
    state: AppState,
    config: ServerConfig,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "transcription HTTP server listening"
    );
    serve(listener, build_router(state, max_upload_bytes), shutdown_signal()).await
}

pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
