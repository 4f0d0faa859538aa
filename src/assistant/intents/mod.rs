//! Recognizer implementations, grouped by what they look at.
//!
//! Each recognizer is a pair of plain functions: `*_applies` checks the
//! trigger keywords, the handler builds the [`Outcome`](super::matcher::Outcome)
//! or returns `None` to let later recognizers try.

pub mod catalog_queries;
pub mod dates;
pub mod listing;
pub mod recipients;
pub mod reminders;

/// Maximum records shown by the "latest N" style listings.
pub(crate) const LIST_LIMIT: usize = 10;

pub(crate) const NO_RECORDS: &str = "📭 No hay paquetes registrados";

/// The last `n` items of `items`, oldest first.
pub(crate) fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// `_(Mostrando últimos 10 de N total)_` when `total` exceeds the limit.
pub(crate) fn truncation_footer(total: usize) -> Option<String> {
    (total > LIST_LIMIT).then(|| format!("_(Mostrando últimos {LIST_LIMIT} de {total} total)_"))
}
