//! `store`: SQLite persistence for package records.
//!
//! One table, one row per package. The autoincrement `id` column is the
//! insertion order; [`PackageStore::list`] returns rows in that order so the
//! last element of a snapshot is the most recently registered package.
//!
//! Every operation opens a fresh connection, the same way the desk's HTTP
//! handlers and the console channel can share a store without a pool.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::package::fields::RawRecord;
use crate::package::{DocumentType, NotifyChannel, PackageRecord, Status};

/// Schema version stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

const COLUMNS: &str = "pickup_code, branch, receptionist, provider, document_type, document_number, \
     received_date, received_time, recipient_name, recipient_email, channel, remarks, \
     attachment_url, check_amount, check_due_date, status, notified_at, collected_at, collected_by";

/// Optional filters for listing; every set filter must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageFilter {
    /// Case-insensitive equality on branch.
    pub branch: Option<String>,
    /// Status label or English name (`"Pendiente"`, `"pending"`).
    pub status: Option<String>,
    /// Case-insensitive substring of the recipient name.
    pub recipient: Option<String>,
}

impl PackageFilter {
    pub fn matches(&self, record: &PackageRecord) -> bool {
        if let Some(b) = nonblank(&self.branch)
            && record.branch.to_lowercase() != b.to_lowercase()
        {
            return false;
        }
        if let Some(s) = nonblank(&self.status) {
            match Status::parse(s) {
                Ok(status) if status == record.status => {}
                _ => return false,
            }
        }
        if let Some(r) = nonblank(&self.recipient)
            && !record.recipient_name.to_lowercase().contains(&r.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Run a store call on the blocking pool so SQLite never stalls an async
/// worker.
pub async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Store(format!("blocking task failed: {e}")))?
}

fn nonblank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Handle to the package database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PackageStore {
    db_path: PathBuf,
}

impl PackageStore {
    /// Open (creating if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { db_path: db_path.to_path_buf() };
        store.init_db()?;
        info!(path = %store.db_path.display(), "package store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Every record, oldest first.
    pub fn list(&self) -> Result<Vec<PackageRecord>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "listed packages");
        Ok(records)
    }

    /// Records matching `filter`, oldest first.
    pub fn list_filtered(&self, filter: &PackageFilter) -> Result<Vec<PackageRecord>, AppError> {
        Ok(self.list()?.into_iter().filter(|r| filter.matches(r)).collect())
    }

    pub fn get_by_code(&self, code: &str) -> Result<Option<PackageRecord>, AppError> {
        let conn = self.open_conn()?;
        Self::find(&conn, code)
    }

    /// Insert a new record. A pickup code that already exists yields
    /// [`AppError::Duplicate`].
    pub fn insert(&self, record: &PackageRecord) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        Self::insert_with(&conn, record)?;
        debug!(code = %record.pickup_code, "inserted package");
        Ok(())
    }

    /// Move a record from `Pending` to `Notified`.
    pub fn mark_notified(&self, code: &str, at: &str) -> Result<PackageRecord, AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE packages SET status = ?1, notified_at = ?2 \
             WHERE pickup_code = ?3 COLLATE NOCASE AND status = ?4",
            params![Status::Notified.label(), at, code.trim(), Status::Pending.label()],
        )?;
        let record = Self::after_transition(&tx, code, changed, Status::Notified)?;
        tx.commit()?;
        Ok(record)
    }

    /// Record a pickup. Terminal; a collected record cannot be collected again.
    ///
    /// The status guard is part of the `UPDATE`, run under an immediate
    /// transaction; of two concurrent collects only one changes the row.
    pub fn mark_collected(&self, code: &str, collector: &str, at: &str) -> Result<PackageRecord, AppError> {
        let collector = collector.trim();
        if collector.is_empty() {
            return Err(AppError::Validation("collector name is required".into()));
        }
        let mut conn = self.open_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE packages SET status = ?1, collected_at = ?2, collected_by = ?3 \
             WHERE pickup_code = ?4 COLLATE NOCASE AND status != ?1",
            params![Status::Collected.label(), at, collector, code.trim()],
        )?;
        let record = Self::after_transition(&tx, code, changed, Status::Collected)?;
        tx.commit()?;
        Ok(record)
    }

    /// Bulk-load legacy rows in either key spelling. Rows without a code or
    /// with a code already present are skipped. Returns how many were added.
    pub fn import_raw(&self, rows: &[RawRecord]) -> Result<usize, AppError> {
        let mut conn = self.open_conn()?;
        let tx = conn.transaction()?;
        let mut imported = 0;
        for (i, raw) in rows.iter().enumerate() {
            let record = match PackageRecord::from_raw(raw) {
                Ok(r) => r,
                Err(e) => {
                    warn!(row = i, error = %e, "skipping undecodable row");
                    continue;
                }
            };
            match Self::insert_with(&tx, &record) {
                Ok(()) => imported += 1,
                Err(AppError::Duplicate(code)) => {
                    warn!(row = i, %code, "skipping duplicate row");
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;
        info!(imported, total = rows.len(), "imported legacy rows");
        Ok(imported)
    }

    // ── internals ─────────────────────────────────────────────────────────────

    fn insert_with(conn: &Connection, r: &PackageRecord) -> Result<(), AppError> {
        let result = conn.execute(
            &format!(
                "INSERT INTO packages ({COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ),
            params![
                r.pickup_code,
                r.branch,
                r.receptionist,
                r.provider,
                r.document_type.label(),
                r.document_number,
                r.received_date,
                r.received_time,
                r.recipient_name,
                r.recipient_email,
                r.channel.label(),
                r.remarks,
                r.attachment_url,
                r.check_amount,
                r.check_due_date,
                r.status.label(),
                r.notified_at,
                r.collected_at,
                r.collected_by,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(AppError::Duplicate(r.pickup_code.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find(conn: &Connection, code: &str) -> Result<Option<PackageRecord>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages WHERE pickup_code = ?1 COLLATE NOCASE"
        ))?;
        Ok(stmt.query_row(params![code.trim()], row_to_record).optional()?)
    }

    fn require(conn: &Connection, code: &str) -> Result<PackageRecord, AppError> {
        Self::find(conn, code)?.ok_or_else(|| AppError::NotFound(format!("package {code}")))
    }

    /// Re-read a record after a guarded status `UPDATE`. No changed row means
    /// the code is unknown or the record already moved past `next`.
    fn after_transition(
        conn: &Connection,
        code: &str,
        changed: usize,
        next: Status,
    ) -> Result<PackageRecord, AppError> {
        let record = Self::require(conn, code)?;
        if changed == 1 {
            debug!(code = %record.pickup_code, status = %next, "status advanced");
            return Ok(record);
        }
        Err(AppError::Validation(format!(
            "package {} is {} and cannot become {}",
            record.pickup_code, record.status, next
        )))
    }

    fn init_db(&self) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        let version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if version == 0 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS packages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    pickup_code TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    branch TEXT NOT NULL,
                    receptionist TEXT NOT NULL,
                    provider TEXT NOT NULL,
                    document_type TEXT NOT NULL,
                    document_number TEXT NOT NULL,
                    received_date TEXT NOT NULL,
                    received_time TEXT NOT NULL,
                    recipient_name TEXT NOT NULL,
                    recipient_email TEXT NOT NULL,
                    channel TEXT NOT NULL,
                    remarks TEXT,
                    attachment_url TEXT,
                    check_amount TEXT,
                    check_due_date TEXT,
                    status TEXT NOT NULL,
                    notified_at TEXT,
                    collected_at TEXT,
                    collected_by TEXT
                );

                PRAGMA user_version = 1;
                ",
            )?;
            return Ok(());
        }

        if version != SCHEMA_VERSION {
            return Err(AppError::Store(format!(
                "unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        Ok(())
    }

    fn open_conn(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.db_path)
            .map_err(|e| AppError::Store(format!("open {}: {e}", self.db_path.display())))?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(conn)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PackageRecord> {
    let channel: String = row.get(10)?;
    let status: String = row.get(15)?;
    Ok(PackageRecord {
        pickup_code: row.get(0)?,
        branch: row.get(1)?,
        receptionist: row.get(2)?,
        provider: row.get(3)?,
        document_type: DocumentType::parse(&row.get::<_, String>(4)?),
        document_number: row.get(5)?,
        received_date: row.get(6)?,
        received_time: row.get(7)?,
        recipient_name: row.get(8)?,
        recipient_email: row.get(9)?,
        channel: NotifyChannel::parse(&channel).unwrap_or(NotifyChannel::Email),
        remarks: row.get(11)?,
        attachment_url: row.get(12)?,
        check_amount: row.get(13)?,
        check_due_date: row.get(14)?,
        status: Status::parse(&status).unwrap_or(Status::Pending),
        notified_at: row.get(16)?,
        collected_at: row.get(17)?,
        collected_by: row.get(18)?,
    })
}
