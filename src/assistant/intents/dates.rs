//! "What arrived on the 1st of December?"

use std::fmt::Write;
use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;

use crate::assistant::matcher::{Outcome, Query};

const TRIGGERS: &[&str] = &["día", "dia", "fecha", "registrado el", "registro el"];

const MONTHS: [(&str, u32); 12] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

struct MonthPattern {
    name: &'static str,
    number: u32,
    /// "1 de diciembre", "1 diciembre"
    day_first: Regex,
    /// "diciembre 1"
    month_first: Regex,
}

fn month_patterns() -> &'static [MonthPattern] {
    static PATTERNS: OnceLock<Vec<MonthPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MONTHS
            .iter()
            .map(|&(name, number)| MonthPattern {
                name,
                number,
                day_first: Regex::new(&format!(r"(\d{{1,2}})\s+(?:de\s+)?{name}")).expect("static regex"),
                month_first: Regex::new(&format!(r"{name}\s+(\d{{1,2}})")).expect("static regex"),
            })
            .collect()
    })
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20\d{2}").expect("static regex"))
}

pub fn applies(q: &Query<'_>) -> bool {
    q.has_any(TRIGGERS)
}

/// Falls through when no day-and-month pair can be read.
pub fn handle(q: &Query<'_>) -> Option<Outcome> {
    let date = extract_date(&q.lower, q.today.year())?;
    let hits: Vec<_> = q.records.iter().filter(|r| r.received_date.starts_with(&date)).collect();

    if hits.is_empty() {
        return Some(Outcome::Reply(format!("📭 No hay paquetes registrados el {date}")));
    }

    let mut out = format!("📦 **Paquetes registrados el {date}:**\n\n");
    for (i, r) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "{}. **{}**\n   - Destinatario: {}\n   - Tipo: {}\n   - Hora: {}\n\n",
            i + 1,
            r.pickup_code,
            r.recipient_name,
            r.document_type,
            r.received_time
        );
    }
    let _ = write!(out, "**Total: {} paquete(s)**", hits.len());
    Some(Outcome::Reply(out))
}

/// `YYYY-MM-DD` from a lowercased question, or `None`.
fn extract_date(lower: &str, default_year: i32) -> Option<String> {
    for month in month_patterns() {
        if !lower.contains(month.name) {
            continue;
        }
        let captures = month.day_first.captures(lower).or_else(|| month.month_first.captures(lower));
        if let Some(day) = captures.and_then(|c| c.get(1)).and_then(|m| m.as_str().parse::<u32>().ok()) {
            let year = year_re()
                .find(lower)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| default_year.to_string());
            return Some(format!("{year}-{:02}-{day:02}", month.number));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::catalog::Catalog;
    use crate::assistant::matcher::answer;
    use crate::package::{DocumentType, PackageRecord};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn day_before_or_after_month() {
        assert_eq!(extract_date("el 1 de diciembre", 2025).as_deref(), Some("2025-12-01"));
        assert_eq!(extract_date("el 1 diciembre", 2025).as_deref(), Some("2025-12-01"));
        assert_eq!(extract_date("diciembre 15", 2025).as_deref(), Some("2025-12-15"));
    }

    #[test]
    fn explicit_year_wins() {
        assert_eq!(extract_date("3 de marzo de 2024", 2026).as_deref(), Some("2024-03-03"));
    }

    #[test]
    fn month_without_day_is_none() {
        assert_eq!(extract_date("en diciembre", 2025), None);
        assert_eq!(extract_date("qué día es hoy", 2025), None);
    }

    #[test]
    fn lists_matching_records_with_total() {
        let mut a = PackageRecord::sample("PK-251201-DA01", "Ana Soto", "Santiago", DocumentType::Invoice);
        a.received_date = "2025-12-01".into();
        let mut b = PackageRecord::sample("PK-251202-DA02", "Juan Perez", "Santiago", DocumentType::Guide);
        b.received_date = "2025-12-02".into();
        let records = [a, b];

        let out = answer("¿qué llegó el día 1 de diciembre de 2025?", &records, &Catalog::default(), today());
        let Outcome::Reply(text) = out else { panic!("expected reply") };
        assert!(text.contains("2025-12-01"));
        assert!(text.contains("PK-251201-DA01"));
        assert!(!text.contains("PK-251202-DA02"));
        assert!(text.ends_with("**Total: 1 paquete(s)**"));
    }

    #[test]
    fn default_year_is_current_year() {
        let out = answer("fecha 2 de febrero", &[], &Catalog::default(), today());
        assert_eq!(out, Outcome::Reply("📭 No hay paquetes registrados el 2026-02-02".into()));
    }
}
