//! Ordered recognizer table over a record snapshot.
//!
//! [`answer`] is a pure function of the question, the snapshot, the
//! vocabulary and today's date. It never sends anything: reminder intents
//! come back as a [`ReminderPlan`] the caller executes.
//!
//! Recognizers are tried in table order. A recognizer applies when its
//! trigger matches; its handler may still return `None` to fall through to
//! the next one. The first `Some` wins.

use chrono::NaiveDate;

use super::catalog::Catalog;
use super::intents::{catalog_queries, dates, listing, recipients, reminders};
use super::text;
use crate::package::PackageRecord;

pub use super::intents::reminders::{Recipient, ReminderPlan};

/// Result of matching one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No recognizer applied; hand the question to the language model.
    NoMatch,
    /// Finished answer text.
    Reply(String),
    /// Reminders to send; render with [`ReminderPlan::render`] afterwards.
    Remind(ReminderPlan),
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        !matches!(self, Outcome::NoMatch)
    }
}

/// Everything a recognizer may look at.
#[derive(Debug)]
pub struct Query<'a> {
    /// Question as typed.
    pub text: &'a str,
    /// Lowercased question; all keyword checks run against this.
    pub lower: String,
    pub records: &'a [PackageRecord],
    pub catalog: &'a Catalog,
    pub today: NaiveDate,
}

impl Query<'_> {
    pub fn has_any(&self, keywords: &[&str]) -> bool {
        text::contains_any(&self.lower, keywords)
    }

    pub fn has(&self, keyword: &str) -> bool {
        self.lower.contains(keyword)
    }
}

/// One entry of the recognizer table.
pub struct Recognizer {
    pub name: &'static str,
    pub applies: fn(&Query<'_>) -> bool,
    pub handle: fn(&Query<'_>) -> Option<Outcome>,
}

/// The recognizer table, highest priority first.
pub static RECOGNIZERS: [Recognizer; 13] = [
    Recognizer { name: "date", applies: dates::applies, handle: dates::handle },
    Recognizer { name: "branch", applies: catalog_queries::branch_applies, handle: catalog_queries::branch },
    Recognizer {
        name: "document_type",
        applies: catalog_queries::document_type_applies,
        handle: catalog_queries::document_type,
    },
    Recognizer { name: "recipient", applies: recipients::applies, handle: recipients::handle },
    Recognizer { name: "dashboard", applies: listing::dashboard_applies, handle: listing::dashboard },
    Recognizer { name: "bulk_reminder", applies: reminders::bulk_applies, handle: reminders::bulk },
    Recognizer { name: "single_reminder", applies: reminders::single_applies, handle: reminders::single },
    Recognizer { name: "pickup_code", applies: listing::code_applies, handle: listing::code_lookup },
    Recognizer { name: "count", applies: listing::count_applies, handle: listing::count },
    Recognizer { name: "latest", applies: listing::latest_applies, handle: listing::latest },
    Recognizer { name: "list_all", applies: listing::list_applies, handle: listing::list_all },
    Recognizer { name: "recipient_word", applies: recipients::word_applies, handle: recipients::by_word },
    Recognizer { name: "fixed_lists", applies: catalog_queries::fixed_applies, handle: catalog_queries::fixed },
];

/// Match `question` against `records`.
pub fn answer(question: &str, records: &[PackageRecord], catalog: &Catalog, today: NaiveDate) -> Outcome {
    answer_named(question, records, catalog, today).1
}

/// Like [`answer`], also naming the recognizer that produced the outcome.
pub fn answer_named(
    question: &str,
    records: &[PackageRecord],
    catalog: &Catalog,
    today: NaiveDate,
) -> (Option<&'static str>, Outcome) {
    let query = Query { text: question, lower: question.to_lowercase(), records, catalog, today };
    for recognizer in &RECOGNIZERS {
        if !(recognizer.applies)(&query) {
            continue;
        }
        if let Some(outcome) = (recognizer.handle)(&query) {
            return (Some(recognizer.name), outcome);
        }
    }
    (None, Outcome::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DocumentType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()
    }

    fn ask(q: &str, records: &[PackageRecord]) -> (Option<&'static str>, Outcome) {
        answer_named(q, records, &Catalog::default(), today())
    }

    fn reply(outcome: Outcome) -> String {
        match outcome {
            Outcome::Reply(t) => t,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    fn snapshot() -> Vec<PackageRecord> {
        let mut check = PackageRecord::sample("PK-250101-AB12", "Juan Perez", "Santiago", DocumentType::Check);
        check.check_amount = Some("$10.000".into());
        check.received_date = "2025-01-01".into();
        vec![
            check,
            PackageRecord::sample("PK-251201-MA01", "Maria Lopez", "Temuco", DocumentType::Invoice),
            PackageRecord::sample("PK-251201-MA02", "Maria Lopez", "Santiago", DocumentType::Guide),
        ]
    }

    #[test]
    fn table_order_is_fixed() {
        let names: Vec<_> = RECOGNIZERS.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "date",
                "branch",
                "document_type",
                "recipient",
                "dashboard",
                "bulk_reminder",
                "single_reminder",
                "pickup_code",
                "count",
                "latest",
                "list_all",
                "recipient_word",
                "fixed_lists",
            ]
        );
    }

    #[test]
    fn check_count_lists_code_and_amount() {
        let mut check = PackageRecord::sample("PK-250101-AB12", "Juan Perez", "Santiago", DocumentType::Check);
        check.check_amount = Some("$10.000".into());
        let (name, outcome) = ask("¿cuántos cheques hay?", &[check]);
        assert_eq!(name, Some("document_type"));
        let text = reply(outcome);
        assert!(text.contains('1'));
        assert!(text.contains("PK-250101-AB12"));
        assert!(text.contains("$10.000"));
    }

    #[test]
    fn gibberish_is_no_match() {
        assert_eq!(ask("asdkjaslkdj", &snapshot()), (None, Outcome::NoMatch));
        assert!(!answer("", &[], &Catalog::default(), today()).is_match());
    }

    #[test]
    fn reminder_beats_code_lookup() {
        let (name, outcome) = ask("enviar recordatorio por el PK-250101-AB12", &snapshot());
        assert_eq!(name, Some("single_reminder"));
        assert!(!matches!(&outcome, Outcome::Reply(t) if t.contains("Paquete encontrado")));

        let (name, _) = ask("avisar a juan por PK-250101-AB12", &snapshot());
        assert_eq!(name, Some("single_reminder"));
    }

    #[test]
    fn code_lookup_without_reminder_words() {
        let (name, outcome) = ask("info de pk-250101-ab12?", &snapshot());
        assert_eq!(name, Some("pickup_code"));
        let text = reply(outcome);
        assert!(text.starts_with("✅ **Paquete encontrado:**"));
        assert!(text.contains("Juan Perez"));
    }

    #[test]
    fn empty_snapshot_gets_no_records_messages() {
        let questions = [
            "¿qué se registró el día 1 de diciembre?",
            "paquetes por sucursal",
            "paquetes en sucursal temuco",
            "¿cuántas facturas hay?",
            "tipo de documento",
            "dashboard",
            "enviar alertas",
            "enviar recordatorio a maria",
            "buscar PK-250101-AB12",
            "cuántos paquetes hay",
            "el último",
            "listar",
            "hay algo en santiago",
            "alguna ot",
        ];
        for q in questions {
            let text = reply(ask(q, &[]).1);
            assert!(text.starts_with('📭') || text.starts_with('❌') || text.starts_with('📍'), "{q}: {text}");
        }
        // Recipient searches fall through on an empty snapshot.
        assert_eq!(ask("paquetes de maria", &[]).1, Outcome::NoMatch);
        assert_eq!(ask("nombre ana", &[]).1, Outcome::NoMatch);
    }

    #[test]
    fn fallthrough_reaches_later_recognizers() {
        // "dia" inside "claudia" triggers the date recognizer, which finds no
        // date and yields to the count recognizer.
        let (name, _) = ask("cuántos paquetes tiene claudia", &snapshot());
        assert_eq!(name, Some("count"));
    }
}
