//! Counts and top-N groupings over a record snapshot.
//!
//! Used by the dashboard intent and the `/api/stats` endpoint. Ordering is
//! descending by count; equal counts keep first-appearance order.

use serde::Serialize;

use crate::package::fields::Field;
use crate::package::{PackageRecord, Status};

/// Group `records` by the value of `field`, most frequent first.
pub fn group_counts(records: &[PackageRecord], field: Field) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let key = record.get(field);
        match counts.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key.to_string(), 1)),
        }
    }
    // `sort_by` is stable, so ties stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// [`group_counts`] truncated to the `n` largest groups.
pub fn top_n(records: &[PackageRecord], field: Field, n: usize) -> Vec<(String, usize)> {
    let mut counts = group_counts(records, field);
    counts.truncate(n);
    counts
}

/// Snapshot-wide summary for summary panels.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub notified: usize,
    pub collected: usize,
    pub by_branch: Vec<(String, usize)>,
    pub by_document_type: Vec<(String, usize)>,
    pub top_recipients: Vec<(String, usize)>,
    pub top_providers: Vec<(String, usize)>,
}

impl Summary {
    pub fn from_records(records: &[PackageRecord], top: usize) -> Self {
        let with_status = |s: Status| records.iter().filter(|r| r.status == s).count();
        Self {
            total: records.len(),
            pending: with_status(Status::Pending),
            notified: with_status(Status::Notified),
            collected: with_status(Status::Collected),
            by_branch: group_counts(records, Field::Branch),
            by_document_type: group_counts(records, Field::DocumentType),
            top_recipients: top_n(records, Field::RecipientName, top),
            top_providers: top_n(records, Field::Provider, top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DocumentType;

    fn snapshot() -> Vec<PackageRecord> {
        vec![
            PackageRecord::sample("PK-251201-AAA1", "Ana Soto", "Santiago", DocumentType::Invoice),
            PackageRecord::sample("PK-251201-AAA2", "Juan Perez", "Temuco", DocumentType::Check),
            PackageRecord::sample("PK-251201-AAA3", "Ana Soto", "Santiago", DocumentType::Invoice),
            PackageRecord::sample("PK-251201-AAA4", "Luis Rojas", "Iquique", DocumentType::Guide),
            PackageRecord::sample("PK-251201-AAA5", "Ana Soto", "Temuco", DocumentType::Invoice),
        ]
    }

    #[test]
    fn counts_descend() {
        let counts = group_counts(&snapshot(), Field::Branch);
        assert_eq!(counts[0], ("Santiago".to_string(), 2));
        assert_eq!(counts[1], ("Temuco".to_string(), 2));
        assert_eq!(counts[2], ("Iquique".to_string(), 1));
    }

    #[test]
    fn counts_sum_to_total() {
        let records = snapshot();
        for field in [Field::Branch, Field::DocumentType, Field::RecipientName, Field::Provider] {
            let sum: usize = group_counts(&records, field).iter().map(|(_, n)| n).sum();
            assert_eq!(sum, records.len());
        }
    }

    #[test]
    fn top_n_truncates() {
        let top = top_n(&snapshot(), Field::RecipientName, 1);
        assert_eq!(top, vec![("Ana Soto".to_string(), 3)]);
    }

    #[test]
    fn empty_snapshot() {
        assert!(group_counts(&[], Field::Branch).is_empty());
        let s = Summary::from_records(&[], 5);
        assert_eq!(s.total, 0);
        assert!(s.top_providers.is_empty());
    }

    #[test]
    fn summary_counts_statuses() {
        let mut records = snapshot();
        records[0].status = Status::Notified;
        records[1].status = Status::Collected;
        let s = Summary::from_records(&records, 5);
        assert_eq!((s.pending, s.notified, s.collected), (3, 1, 1));
        assert_eq!(s.by_document_type[0], ("Factura".to_string(), 3));
    }
}
