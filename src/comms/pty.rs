//! Console channel: reads questions from stdin and prints the assistant's
//! replies. Runs until the shutdown token is cancelled or stdin closes.
//!
//! `/ejemplos` prints the suggested questions.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use crate::assistant::catalog::SUGGESTED_QUESTIONS;
use crate::error::AppError;
use crate::runtime::{Component, ComponentFuture};

const EXAMPLES_COMMAND: &str = "/ejemplos";

pub struct PtyChannel {
    channel_id: String,
    state: Arc<CommsState>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.state, shutdown))
    }
}

async fn run_pty(channel_id: String, state: Arc<CommsState>, shutdown: CancellationToken) -> Result<(), AppError> {
    info!(%channel_id, "pty channel started");
    println!("─────────────────────────────────");
    println!(" {}  (Ctrl-C para salir, {EXAMPLES_COMMAND} para ejemplos)", state.name);
    println!("─────────────────────────────────");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!(%channel_id, "pty channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!(%channel_id, "pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!(%channel_id, "pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input,
                };
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == EXAMPLES_COMMAND {
                    for q in SUGGESTED_QUESTIONS {
                        println!("  • {q}");
                    }
                    continue;
                }

                debug!(%channel_id, %input, "pty received line");
                match state.chat(Some(channel_id.as_str()), input).await {
                    Ok(turn) => println!("{}\n", turn.reply),
                    Err(e) => {
                        warn!(%channel_id, "chat failed: {e}");
                        println!("❌ {e}\n");
                    }
                }
            }
        }
    }
    Ok(())
}
