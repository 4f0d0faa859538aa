//! Recipient notifications: email through Microsoft Graph and a one-line
//! chat message through a Teams incoming webhook.
//!
//! Every public call returns a plain value ([`Dispatch`] or `bool`). Remote
//! failures are expected and frequent (expired secrets, webhook removed);
//! they are logged and reported, never propagated as errors.

pub mod directory;
pub mod graph;
pub mod outbox;
pub mod templates;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::NotifyConfig;
use crate::error::AppError;
use directory::DirectoryEntry;

// ── Result types ──────────────────────────────────────────────────────────────

/// Outcome of a reminder send, ready to show to a person.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Dispatch {
    pub success: bool,
    pub message: String,
}

impl Dispatch {
    pub fn sent(email: &str) -> Self {
        Self { success: true, message: format!("✅ Recordatorio enviado exitosamente a {email}") }
    }

    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self { success: false, message: format!("❌ No se pudo enviar el recordatorio: {reason}") }
    }
}

/// Why a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// All available delivery backends. Cheap to clone.
#[derive(Debug, Clone)]
pub enum Dispatcher {
    Graph(graph::GraphDispatcher),
    Outbox(outbox::Outbox),
}

impl Dispatcher {
    /// Factory called at startup from `[notify].default`.
    pub fn build(config: &NotifyConfig) -> Result<Self, AppError> {
        match config.dispatcher.as_str() {
            "outbox" => Ok(Dispatcher::Outbox(outbox::Outbox::new(config.signature.clone()))),
            "graph" => Ok(Dispatcher::Graph(graph::GraphDispatcher::new(config)?)),
            other => Err(AppError::Config(format!("unknown notify dispatcher: {other}"))),
        }
    }

    pub fn signature(&self) -> &str {
        match self {
            Dispatcher::Graph(g) => g.signature(),
            Dispatcher::Outbox(o) => o.signature(),
        }
    }

    /// Send one HTML email. `true` when the provider accepted it.
    pub async fn send_email(&self, to: &str, subject: &str, html: &str) -> bool {
        match self.try_send_email(to, subject, html).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%to, error = %e, "email not sent");
                false
            }
        }
    }

    /// Post one line to the chat channel. `true` when the webhook accepted it.
    pub async fn notify_channel(&self, text: &str) -> bool {
        let result = match self {
            Dispatcher::Graph(g) => g.post_webhook(text).await,
            Dispatcher::Outbox(o) => o.post_webhook(text),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "chat notification not sent");
                false
            }
        }
    }

    /// Email a pickup reminder to `email`, addressed to `name`.
    pub async fn send_reminder(&self, email: &str, name: &str) -> Dispatch {
        let subject = format!("⏰ Recordatorio: Correspondencia pendiente - {name}");
        let html = templates::reminder_email(name, self.signature());
        match self.try_send_email(email, &subject, &html).await {
            Ok(()) => {
                info!(%email, "reminder sent");
                Dispatch::sent(email)
            }
            Err(e) => {
                warn!(%email, error = %e, "reminder not sent");
                Dispatch::failed(e)
            }
        }
    }

    /// People and mail-enabled groups whose name or address contains
    /// `query`. Queries shorter than [`directory::MIN_QUERY_LEN`] find nothing.
    pub async fn search_directory(&self, query: &str) -> Result<Vec<DirectoryEntry>, NotifyError> {
        let query = query.trim();
        if !directory::searchable(query) {
            return Ok(Vec::new());
        }
        match self {
            Dispatcher::Graph(g) => g.search_directory(query).await,
            Dispatcher::Outbox(o) => o.search_directory(query),
        }
    }

    async fn try_send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        match self {
            Dispatcher::Graph(g) => g.send_mail(to, subject, html).await,
            Dispatcher::Outbox(o) => o.send_mail(to, subject, html),
        }
    }
}
