//! The desk assistant: answers Spanish questions about registered packages.
//!
//! One question is handled to completion:
//!
//! ```text
//! store.list() ─▶ matcher::answer ─┬─ Reply ─────────────────────────▶ text
//!                                  ├─ Remind ─▶ send_reminder × N ─▶ text
//!                                  └─ NoMatch ─▶ fallback::respond ─▶ text
//! ```
//!
//! The matcher is pure; sending and the model call happen here.

pub mod catalog;
pub mod fallback;
pub mod intents;
pub mod matcher;
pub mod prompt;
pub mod render;
pub mod session;
pub mod text;

use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::notify::Dispatcher;
use crate::package::PackageRecord;
use crate::store::{PackageStore, blocking};
use catalog::Catalog;
use matcher::Outcome;
use session::{Conversation, ReplySource};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: ReplySource,
}

#[derive(Debug, Clone)]
pub struct Assistant {
    store: PackageStore,
    dispatcher: Dispatcher,
    llm: LlmProvider,
    catalog: Catalog,
    prompts_dir: PathBuf,
    context_limit: usize,
}

impl Assistant {
    pub fn new(
        store: PackageStore,
        dispatcher: Dispatcher,
        llm: LlmProvider,
        catalog: Catalog,
        prompts_dir: PathBuf,
        context_limit: usize,
    ) -> Self {
        Self { store, dispatcher, llm, catalog, prompts_dir, context_limit }
    }

    /// Answer `question`, appending both turns to `conversation`.
    pub async fn ask(&self, question: &str, conversation: &mut Conversation) -> Result<ChatReply, AppError> {
        let question = question.trim();
        conversation.push_user(question);

        let records = self.snapshot().await?;
        let today = Local::now().date_naive();
        let (recognizer, outcome) = matcher::answer_named(question, &records, &self.catalog, today);
        debug!(recognizer = recognizer.unwrap_or("none"), records = records.len(), "question matched");

        let reply = match outcome {
            Outcome::Reply(text) => ChatReply { reply: text, source: ReplySource::Rules },
            Outcome::Remind(plan) => {
                let mut results = Vec::new();
                for r in plan.recipients() {
                    results.push(self.dispatcher.send_reminder(&r.email, &r.name).await);
                }
                let sent = results.iter().filter(|d| d.success).count();
                info!(sent, failed = results.len() - sent, "reminders dispatched");
                ChatReply { reply: plan.render(&results), source: ReplySource::Rules }
            }
            Outcome::NoMatch => {
                let text =
                    fallback::respond(&self.llm, &self.prompts_dir, question, &records, self.context_limit).await;
                ChatReply { reply: text, source: ReplySource::Model }
            }
        };

        conversation.push_assistant(&reply.reply, reply.source);
        Ok(reply)
    }

    async fn snapshot(&self) -> Result<Vec<PackageRecord>, AppError> {
        let store = self.store.clone();
        blocking(move || store.list()).await
    }
}
