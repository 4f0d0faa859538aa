//! External I/O channels: the HTTP API and the interactive console.
//!
//! Each channel implements [`Component`] and captures an `Arc<CommsState>`
//! at construction. [`start`] spawns the configured ones and returns a
//! handle the caller may await.

pub mod http;
pub mod pty;
mod state;

pub use state::{ChatTurn, CommsState};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::runtime::{Component, ComponentsHandle, spawn_components};

pub fn start(config: &Config, state: Arc<CommsState>, shutdown: CancellationToken) -> ComponentsHandle {
    let mut components: Vec<Box<dyn Component>> = Vec::new();

    if config.comms_http_should_load() {
        info!(bind = %config.comms.http.bind, "loading http channel");
        components.push(Box::new(http::HttpChannel::new("http0", config.comms.http.bind.clone(), state.clone())));
    }
    if config.comms_pty_should_load() {
        info!("loading pty channel");
        components.push(Box::new(pty::PtyChannel::new("pty0", state)));
    }
    if components.is_empty() {
        warn!("no comms channels configured, nothing to serve");
    }

    spawn_components(components, shutdown)
}
