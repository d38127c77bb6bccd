//! REST front-end of the DA gateway.
//!
//! Translates HTTP requests into calls to [`EigenDAManager`] and [`KeccakManager`]. Commitments travel
//! as hex strings in the standard encoding, i.e. the cert version byte followed by the serialized cert.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use da_gateway_config::ApiConfig;
use da_gateway_store::{EigenDAManager, KeccakManager};
use tokio::sync::watch;

mod api_impl;
mod errors;
mod metrics;
#[cfg(test)]
mod tests;

/// Shared state of the REST handlers.
#[derive(Debug)]
pub struct RestApi {
    manager: Arc<EigenDAManager>,
    keccak_manager: Arc<KeccakManager>,
}

impl RestApi {
    pub fn new(manager: Arc<EigenDAManager>, keccak_manager: Arc<KeccakManager>) -> Self {
        Self {
            manager,
            keccak_manager,
        }
    }

    /// Creates the router. Request bodies larger than `max_body_bytes` are rejected.
    pub fn into_router(self, max_body_bytes: usize) -> Router {
        Router::new()
            .route("/put", post(Self::put_payload))
            .route("/put/{key}", axum::routing::put(Self::put_preimage))
            .route("/get/{commitment}", get(Self::get_payload))
            .route("/get/keccak/{key}", get(Self::get_preimage))
            .route(
                "/admin/dispersal-backend",
                get(Self::get_dispersal_backend).put(Self::set_dispersal_backend),
            )
            .route("/health", get(|| async { "ok" }))
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .with_state(Arc::new(self))
    }
}

pub async fn run_server(
    api: RestApi,
    config: &ApiConfig,
    mut stop_receiver: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let bind_address = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::debug!("Starting DA gateway API on {bind_address}");
    let app = api.into_router(config.max_put_body_bytes);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed binding DA gateway API to {bind_address}"))?;
    tracing::info!("DA gateway API is listening on {bind_address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if stop_receiver.changed().await.is_err() {
                tracing::warn!(
                    "Stop signal sender for DA gateway API was dropped without sending a signal"
                );
            }
            tracing::info!("Stop signal received, DA gateway API is shutting down");
        })
        .await
        .context("DA gateway API failed")?;
    tracing::info!("DA gateway API shut down");
    Ok(())
}
