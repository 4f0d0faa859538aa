//! In-memory delivery backend. Nothing leaves the process; every message is
//! kept for inspection. Used for dry runs and by tests.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use super::NotifyError;
use super::directory::{self, DirectoryEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Default)]
struct Inner {
    emails: Vec<SentEmail>,
    chat: Vec<String>,
    directory: Vec<DirectoryEntry>,
    fail_email: bool,
    fail_chat: bool,
}

/// Shared handle; clones see the same messages.
#[derive(Debug, Clone)]
pub struct Outbox {
    inner: Arc<Mutex<Inner>>,
    signature: String,
}

impl Outbox {
    pub fn new(signature: String) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())), signature }
    }

    /// Make later email deliveries fail (they are still recorded).
    pub fn fail_email(&self, fail: bool) {
        self.lock().fail_email = fail;
    }

    /// Make later chat deliveries fail (they are still recorded).
    pub fn fail_chat(&self, fail: bool) {
        self.lock().fail_chat = fail;
    }

    pub fn emails(&self) -> Vec<SentEmail> {
        self.lock().emails.clone()
    }

    pub fn chat_lines(&self) -> Vec<String> {
        self.lock().chat.clone()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Add a person or group for directory searches to find.
    pub fn add_directory_entry(&self, entry: DirectoryEntry) {
        self.lock().directory.push(entry);
    }

    pub(super) fn search_directory(&self, query: &str) -> Result<Vec<DirectoryEntry>, NotifyError> {
        let found = self.lock().directory.iter().filter(|e| e.matches(query)).cloned().collect();
        Ok(directory::cap(found))
    }

    pub(super) fn send_mail(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.emails.push(SentEmail { to: to.into(), subject: subject.into(), html: html.into() });
        info!(%to, %subject, "outbox: email recorded");
        if inner.fail_email { Err(NotifyError::Status(503)) } else { Ok(()) }
    }

    pub(super) fn post_webhook(&self, text: &str) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.chat.push(text.into());
        info!(len = text.len(), "outbox: chat line recorded");
        if inner.fail_chat { Err(NotifyError::Status(503)) } else { Ok(()) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
