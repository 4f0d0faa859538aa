//! Shared state handed to every comms channel as `Arc<CommsState>`.
//!
//! Channels only see the desk workflows, the assistant and the session
//! book; the store and dispatcher stay behind those.

use tracing::debug;

use crate::assistant::Assistant;
use crate::assistant::session::SessionBook;
use crate::desk::Desk;
use crate::error::AppError;
use crate::package::PackageRecord;
use crate::store::{PackageFilter, blocking};

pub struct CommsState {
    pub name: String,
    pub desk: Desk,
    pub assistant: Assistant,
    pub sessions: SessionBook,
}

/// Answer for one chat request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatTurn {
    pub session_id: String,
    pub reply: String,
    pub source: crate::assistant::session::ReplySource,
}

impl CommsState {
    pub fn new(name: String, desk: Desk, assistant: Assistant, sessions: SessionBook) -> Self {
        Self { name, desk, assistant, sessions }
    }

    /// Ask the assistant within session `session_id` (a new one when absent).
    pub async fn chat(&self, session_id: Option<&str>, question: &str) -> Result<ChatTurn, AppError> {
        if question.trim().is_empty() {
            return Err(AppError::Validation("question is empty".into()));
        }
        let session_id = SessionBook::resolve_id(session_id);
        let handle = self.sessions.open(&session_id);
        let mut conversation = handle.lock().await;
        let reply = self.assistant.ask(question, &mut conversation).await?;
        drop(conversation);
        debug!(%session_id, source = ?reply.source, "chat answered");
        Ok(ChatTurn { session_id, reply: reply.reply, source: reply.source })
    }

    /// Filtered listing, read off the async workers.
    pub async fn packages(&self, filter: PackageFilter) -> Result<Vec<PackageRecord>, AppError> {
        let store = self.desk.store().clone();
        blocking(move || store.list_filtered(&filter)).await
    }

    pub async fn package(&self, code: String) -> Result<PackageRecord, AppError> {
        let store = self.desk.store().clone();
        blocking(move || store.get_by_code(&code)?.ok_or_else(|| AppError::NotFound(format!("package {code}"))))
            .await
    }

    pub async fn collect(&self, code: String, collector: String) -> Result<PackageRecord, AppError> {
        let desk = self.desk.clone();
        blocking(move || desk.collect(&code, &collector)).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::assistant::catalog::Catalog;
    use crate::assistant::session::ReplySource;
    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::notify::Dispatcher;
    use crate::notify::outbox::Outbox;
    use crate::store::PackageStore;

    fn state(dir: &tempfile::TempDir) -> Arc<CommsState> {
        let store = PackageStore::open(&dir.path().join("packages.db")).unwrap();
        let dispatcher = Dispatcher::Outbox(Outbox::new("Recepción".into()));
        let assistant = Assistant::new(
            store.clone(),
            dispatcher.clone(),
            LlmProvider::Dummy(DummyProvider),
            Catalog::default(),
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/config/prompts")),
            50,
        );
        Arc::new(CommsState::new("test".into(), Desk::new(store, dispatcher), assistant, SessionBook::new(100, 8)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_questions_on_one_session_keep_every_turn() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move { state.chat(Some("s1"), &format!("asdk {i}")).await })
            })
            .collect();
        for t in tasks {
            let turn = t.await.unwrap().unwrap();
            assert_eq!(turn.session_id, "s1");
            assert_eq!(turn.source, ReplySource::Model);
        }

        let log = state.sessions.get("s1").await.unwrap();
        assert_eq!(log.len(), 16);
        let turns: Vec<_> = log.turns().collect();
        for pair in turns.chunks(2) {
            assert_eq!(pair[1].text, format!("[echo] {}", pair[0].text));
        }
    }

    #[tokio::test]
    async fn unknown_package_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        assert!(matches!(state.package("PK-000000-0000".into()).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.chat(None, "  ").await, Err(AppError::Validation(_))));
    }
}
