//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::output::ConfiguredOutputRouter;
use crate::playback::ControllerHandle;
use crate::settings_store::SettingsStore;
use crate::telephony::ManualTelephony;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub controller: ControllerHandle,
    pub settings: Arc<SettingsStore>,
    pub telephony: Arc<ManualTelephony>,
    pub output: Arc<ConfiguredOutputRouter>,
}

/// Build the API router
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/status", get(super::handlers::get_status))
        .route("/commands", post(super::handlers::post_command))
        .route("/telephony", put(super::handlers::put_telephony))
        .route(
            "/settings",
            get(super::handlers::get_settings).put(super::handlers::put_settings),
        )
        .route("/output", put(super::handlers::put_output))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run<F>(port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
