//! Per-session conversation log.
//!
//! A [`Conversation`] is a capped transcript (oldest turns dropped first)
//! owned by whoever talks to the assistant. The matcher never reads it; it
//! exists so the UI can redraw a chat after a reload.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;
use uuid::Uuid;

/// Maximum number of turns kept when no cap is configured.
pub const DEFAULT_TRANSCRIPT_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Who produced an assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Rules,
    Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Set on assistant turns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ReplySource>,
    /// RFC 3339, UTC.
    pub at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    cap: usize,
    turns: VecDeque<Turn>,
}

impl Conversation {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1), turns: VecDeque::new() }
    }

    pub fn push_user(&mut self, text: &str) {
        self.push(Turn { role: Role::User, text: text.to_string(), source: None, at: now() });
    }

    pub fn push_assistant(&mut self, text: &str, source: ReplySource) {
        self.push(Turn { role: Role::Assistant, text: text.to_string(), source: Some(source), at: now() });
    }

    fn push(&mut self, turn: Turn) {
        while self.turns.len() >= self.cap {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCRIPT_CAP)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Shared handle to one session's log. Held for the whole question so that
/// questions on the same session are answered one at a time.
pub type SessionHandle = Arc<AsyncMutex<Conversation>>;

#[derive(Debug)]
struct Slot {
    conversation: SessionHandle,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Book {
    clock: u64,
    slots: HashMap<String, Slot>,
}

/// Conversations keyed by session id, shared by the HTTP handlers.
///
/// At most `max_sessions` are kept; opening one more drops the least
/// recently used.
#[derive(Debug)]
pub struct SessionBook {
    transcript_cap: usize,
    max_sessions: usize,
    book: Mutex<Book>,
}

impl SessionBook {
    pub fn new(transcript_cap: usize, max_sessions: usize) -> Self {
        Self { transcript_cap, max_sessions: max_sessions.max(1), book: Mutex::new(Book::default()) }
    }

    fn lock(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reuse `id` when given, otherwise mint a fresh UUID.
    pub fn resolve_id(id: Option<&str>) -> String {
        match id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// Handle to the log of `id`, created empty on first use.
    pub fn open(&self, id: &str) -> SessionHandle {
        let mut book = self.lock();
        book.clock += 1;
        let tick = book.clock;

        if let Some(slot) = book.slots.get_mut(id) {
            slot.last_used = tick;
            return slot.conversation.clone();
        }

        if book.slots.len() >= self.max_sessions {
            let oldest = book.slots.iter().min_by_key(|(_, s)| s.last_used).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                book.slots.remove(&oldest);
                debug!(session_id = %oldest, "session evicted");
            }
        }

        let conversation = Arc::new(AsyncMutex::new(Conversation::new(self.transcript_cap)));
        book.slots.insert(id.to_string(), Slot { conversation: conversation.clone(), last_used: tick });
        conversation
    }

    /// Copy of a session's log, if the session exists. Waits for a question
    /// in progress on that session.
    pub async fn get(&self, id: &str) -> Option<Conversation> {
        let handle = self.lock().slots.get(id).map(|s| s.conversation.clone())?;
        let conversation = handle.lock().await;
        Some(conversation.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_turns_are_dropped_first() {
        let mut c = Conversation::new(3);
        c.push_user("uno");
        c.push_assistant("dos", ReplySource::Rules);
        c.push_user("tres");
        c.push_assistant("cuatro", ReplySource::Model);
        let texts: Vec<_> = c.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["dos", "tres", "cuatro"]);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn turns_serialise_with_source() {
        let mut c = Conversation::new(5);
        c.push_user("hola");
        c.push_assistant("📭", ReplySource::Model);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["turns"][0]["role"], "user");
        assert!(json["turns"][0].get("source").is_none());
        assert_eq!(json["turns"][1]["source"], "model");
    }

    #[tokio::test]
    async fn book_keeps_sessions_by_id() {
        let book = SessionBook::new(10, 8);
        let id = SessionBook::resolve_id(None);
        assert_eq!(id.len(), 36);
        assert_eq!(SessionBook::resolve_id(Some(" abc ")), "abc");

        book.open(&id).lock().await.push_user("hola");
        book.open(&id).lock().await.push_user("otra vez");
        assert_eq!(book.get(&id).await.unwrap().len(), 2);
        assert!(book.get("nope").await.is_none());
        assert_eq!(book.len(), 1);
    }

    #[tokio::test]
    async fn log_stays_visible_while_a_question_is_open() {
        let book = SessionBook::new(10, 8);
        let handle = book.open("s1");
        let mut convo = handle.lock().await;
        convo.push_user("hola");
        assert_eq!(book.len(), 1);
        drop(convo);
        assert_eq!(book.get("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let book = SessionBook::new(10, 2);
        book.open("a").lock().await.push_user("uno");
        book.open("b").lock().await.push_user("dos");
        book.open("a");
        book.open("c");

        assert_eq!(book.len(), 2);
        assert!(book.get("a").await.is_some());
        assert!(book.get("b").await.is_none());
        assert!(book.get("c").await.unwrap().is_empty());
    }
}
