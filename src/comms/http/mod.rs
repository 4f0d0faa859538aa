//! HTTP channel on axum. The shutdown token drives graceful shutdown.
//!
//! ```text
//! GET  /api/health
//! GET  /api/packages?branch=&status=&recipient=
//! POST /api/packages
//! GET  /api/packages/{code}
//! POST /api/packages/{code}/collect
//! POST /api/reminders
//! GET  /api/recipients?query=
//! GET  /api/stats
//! POST /api/chat
//! GET  /api/chat/suggestions
//! GET  /api/sessions/{id}
//! ```

mod api;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::state::CommsState;
use crate::error::AppError;
use crate::runtime::{Component, ComponentFuture};

pub struct HttpChannel {
    channel_id: String,
    bind_addr: String,
    state: Arc<CommsState>,
}

impl HttpChannel {
    pub fn new(channel_id: impl Into<String>, bind_addr: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), bind_addr: bind_addr.into(), state }
    }
}

impl Component for HttpChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(serve(self.channel_id, self.bind_addr, self.state, shutdown))
    }
}

async fn serve(
    channel_id: String,
    bind_addr: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("http bind failed on {bind_addr}: {e}")))?;
    info!(%channel_id, %bind_addr, "http channel listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("http server error: {e}")))?;

    info!(%channel_id, "http channel shut down");
    Ok(())
}

pub fn router(state: Arc<CommsState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/packages", get(api::list_packages).post(api::register))
        .route("/api/packages/{code}", get(api::get_package))
        .route("/api/packages/{code}/collect", post(api::collect))
        .route("/api/reminders", post(api::remind))
        .route("/api/recipients", get(api::recipients))
        .route("/api/stats", get(api::stats))
        .route("/api/chat", post(api::chat))
        .route("/api/chat/suggestions", get(api::suggestions))
        .route("/api/sessions/{id}", get(api::session))
        .with_state(state)
}
