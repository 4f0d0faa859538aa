//! Desk workflows: register an arrival, record a pickup, send a reminder.

use std::sync::OnceLock;

use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::notify::directory::DirectoryEntry;
use crate::notify::{Dispatch, Dispatcher, templates};
use crate::package::{PackageDraft, PackageRecord, Status, code};
use crate::store::{PackageStore, blocking};

/// Attempts at drawing a fresh pickup code before giving up.
const CODE_ATTEMPTS: usize = 5;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registered {
    /// `<UTC %Y%m%d%H%M%S>-<code>`.
    pub id: String,
    pub pickup_code: String,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct Desk {
    store: PackageStore,
    dispatcher: Dispatcher,
}

impl Desk {
    pub fn new(store: PackageStore, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Store `draft` as a pending package and notify the recipient through
    /// the channels it asked for. The record becomes `Notified` when at
    /// least one channel accepted the message.
    pub async fn register(&self, draft: PackageDraft) -> Result<Registered, AppError> {
        if !email_re().is_match(draft.recipient_email.trim()) {
            return Err(AppError::Validation(format!("invalid recipient email '{}'", draft.recipient_email)));
        }

        let now = Local::now();
        let date = draft.received_date.clone().unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
        let time = draft.received_time.clone().unwrap_or_else(|| now.format("%H:%M:%S").to_string());
        let wanted = draft.pickup_code.as_deref().map(|c| c.trim().to_uppercase());

        let store = self.store.clone();
        let today = now.date_naive();
        let record = blocking(move || match wanted {
            Some(code) => {
                let record = PackageRecord::from_draft(draft, code, date, time);
                store.insert(&record).map(|()| record)
            }
            None => insert_with_fresh_code(&store, draft, date, time, today),
        })
        .await?;
        info!(code = %record.pickup_code, recipient = %record.recipient_email, "package registered");

        let mut delivered = false;
        if record.channel.wants_email() {
            let html = templates::arrival_email(&record, self.dispatcher.signature());
            delivered |= self
                .dispatcher
                .send_email(&record.recipient_email, &templates::arrival_subject(&record), &html)
                .await;
        }
        if record.channel.wants_chat() {
            delivered |= self.dispatcher.notify_channel(&templates::arrival_chat_line(&record)).await;
        }

        let status = if delivered {
            let (store, code) = (self.store.clone(), record.pickup_code.clone());
            blocking(move || store.mark_notified(&code, &timestamp())).await?.status
        } else {
            warn!(code = %record.pickup_code, "no channel delivered the arrival notice");
            record.status
        };

        Ok(Registered {
            id: format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), record.pickup_code),
            pickup_code: record.pickup_code,
            status,
        })
    }

    /// Hand a package over to `collector`. Blocking; async callers go
    /// through [`blocking`].
    pub fn collect(&self, code: &str, collector: &str) -> Result<PackageRecord, AppError> {
        let record = self.store.mark_collected(code, collector, &timestamp())?;
        info!(code = %record.pickup_code, collector = %collector.trim(), "package collected");
        Ok(record)
    }

    /// Email a pickup reminder directly.
    pub async fn remind(&self, email: &str, name: &str) -> Result<Dispatch, AppError> {
        let email = email.trim();
        if !email_re().is_match(email) {
            return Err(AppError::Validation(format!("invalid email '{email}'")));
        }
        let name = match name.trim() {
            "" => "Usuario",
            n => n,
        };
        Ok(self.dispatcher.send_reminder(email, name).await)
    }

    /// Directory lookup behind the registration form's recipient field.
    pub async fn find_recipients(&self, query: &str) -> Result<Vec<DirectoryEntry>, AppError> {
        let found = self
            .dispatcher
            .search_directory(query)
            .await
            .map_err(|e| AppError::Comms(format!("directory search failed: {e}")))?;
        debug!(query = %query.trim(), found = found.len(), "recipient search");
        Ok(found)
    }

    pub fn store(&self) -> &PackageStore {
        &self.store
    }
}

fn insert_with_fresh_code(
    store: &PackageStore,
    draft: PackageDraft,
    date: String,
    time: String,
    today: NaiveDate,
) -> Result<PackageRecord, AppError> {
    let mut record = PackageRecord::from_draft(draft, code::generate(today), date, time);
    for _ in 1..CODE_ATTEMPTS {
        match store.insert(&record) {
            Err(AppError::Duplicate(taken)) => {
                warn!(code = %taken, "generated code already taken, drawing again");
                record.pickup_code = code::generate(today);
            }
            other => return other.map(|()| record),
        }
    }
    store.insert(&record)?;
    Ok(record)
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
