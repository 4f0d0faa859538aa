//! Whole-snapshot views: dashboard, code lookup, count, latest and list.

use std::fmt::Write;

use super::reminders::SINGLE_TRIGGERS;
use super::{LIST_LIMIT, last_n};
use crate::assistant::matcher::{Outcome, Query};
use crate::assistant::render;

const DASHBOARD_TRIGGERS: &[&str] = &[
    "dashboard",
    "estadísticas",
    "estadisticas",
    "resumen general",
    "análisis",
    "analisis",
    "métricas",
    "metricas",
];
const COUNT_TRIGGERS: &[&str] = &["cuántos", "cuantos", "cantidad", "total"];
const COUNT_SUBJECTS: &[&str] = &["paquete", "registro"];
const LATEST_TRIGGERS: &[&str] = &["último", "ultimo", "reciente", "más nuevo"];
const LIST_TRIGGERS: &[&str] = &["listar", "mostrar todos", "ver todos"];

const CODE_MARKER: &str = "pk-";

pub fn dashboard_applies(q: &Query<'_>) -> bool {
    q.has_any(DASHBOARD_TRIGGERS)
}

pub fn dashboard(q: &Query<'_>) -> Option<Outcome> {
    Some(Outcome::Reply(render::dashboard(q.records)))
}

// ── pickup code ───────────────────────────────────────────────────────────────

/// A code mention is a lookup only when no reminder wording is present.
pub fn code_applies(q: &Query<'_>) -> bool {
    q.has(CODE_MARKER) && !q.has_any(SINGLE_TRIGGERS)
}

/// Normalised code following the first `pk-` in `lower`.
fn extract_code(lower: &str) -> Option<String> {
    let start = lower.find(CODE_MARKER)? + CODE_MARKER.len();
    let rest = &lower[start..];
    let token = rest.split_whitespace().next().unwrap_or(rest);
    let token = token.trim_end_matches(|c: char| !c.is_alphanumeric());
    Some(format!("PK-{}", token.to_uppercase()))
}

pub fn code_lookup(q: &Query<'_>) -> Option<Outcome> {
    let code = extract_code(&q.lower)?;
    let text = match q.records.iter().find(|r| r.pickup_code.eq_ignore_ascii_case(&code)) {
        Some(record) => render::detail_card("✅ **Paquete encontrado:**", record),
        None => format!("❌ No encontré el código {code} en el historial actual."),
    };
    Some(Outcome::Reply(text))
}

// ── count / latest / list ─────────────────────────────────────────────────────

pub fn count_applies(q: &Query<'_>) -> bool {
    q.has_any(COUNT_TRIGGERS) && q.has_any(COUNT_SUBJECTS)
}

pub fn count(q: &Query<'_>) -> Option<Outcome> {
    let text = match q.records.len() {
        0 => "📭 No hay paquetes registrados.".to_string(),
        1 => "📦 Hay **1 paquete** registrado.".to_string(),
        n => format!("📦 Hay **{n} paquetes** registrados."),
    };
    Some(Outcome::Reply(text))
}

pub fn latest_applies(q: &Query<'_>) -> bool {
    q.has_any(LATEST_TRIGGERS)
}

pub fn latest(q: &Query<'_>) -> Option<Outcome> {
    let text = match q.records.last() {
        Some(record) => render::latest_card(record),
        None => "📭 No hay paquetes registrados todavía.".to_string(),
    };
    Some(Outcome::Reply(text))
}

pub fn list_applies(q: &Query<'_>) -> bool {
    q.has_any(LIST_TRIGGERS)
}

pub fn list_all(q: &Query<'_>) -> Option<Outcome> {
    let total = q.records.len();
    if total == 0 {
        return Some(Outcome::Reply("📭 No hay paquetes registrados.".to_string()));
    }
    let mut out = format!("📋 **Lista de {total} paquete(s):**\n\n");
    for (i, r) in last_n(q.records, LIST_LIMIT).iter().enumerate() {
        let _ = writeln!(out, "{}. {} - {} ({})", i + 1, r.pickup_code, r.recipient_name, r.branch);
    }
    if total > LIST_LIMIT {
        let _ = write!(out, "\n_(Mostrando los últimos {LIST_LIMIT} de {total} total)_");
    }
    Some(Outcome::Reply(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::catalog::Catalog;
    use crate::assistant::matcher::answer_named;
    use crate::package::{DocumentType, PackageRecord};
    use chrono::NaiveDate;

    fn ask(q: &str, records: &[PackageRecord]) -> (Option<&'static str>, String) {
        let today = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        match answer_named(q, records, &Catalog::default(), today) {
            (name, Outcome::Reply(t)) => (name, t),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn records(n: usize) -> Vec<PackageRecord> {
        (0..n)
            .map(|i| PackageRecord::sample(&format!("PK-251201-{i:04}"), "Ana Soto", "Santiago", DocumentType::Guide))
            .collect()
    }

    #[test]
    fn code_is_normalised_before_lookup() {
        assert_eq!(extract_code("código pk-251201-ab12?"), Some("PK-251201-AB12".into()));
        assert_eq!(extract_code("pk-x1, por favor"), Some("PK-X1".into()));
        assert_eq!(extract_code("nada"), None);
    }

    #[test]
    fn unknown_code_reply() {
        let (name, text) = ask("buscar PK-999999-ZZZZ", &records(2));
        assert_eq!(name, Some("pickup_code"));
        assert_eq!(text, "❌ No encontré el código PK-999999-ZZZZ en el historial actual.");
    }

    #[test]
    fn count_singular_and_plural() {
        assert_eq!(ask("cuántos paquetes hay", &records(1)).1, "📦 Hay **1 paquete** registrado.");
        assert_eq!(ask("total de registros", &records(3)).1, "📦 Hay **3 paquetes** registrados.");
    }

    #[test]
    fn latest_is_last_in_snapshot() {
        let (name, text) = ask("¿cuál es el más reciente?", &records(3));
        assert_eq!(name, Some("latest"));
        assert!(text.starts_with("📦 **Último paquete registrado:**"));
        assert!(text.contains("PK-251201-0002"));
    }

    #[test]
    fn list_truncates_with_footer() {
        let (name, text) = ask("listar", &records(12));
        assert_eq!(name, Some("list_all"));
        assert!(text.starts_with("📋 **Lista de 12 paquete(s):**"));
        assert!(text.contains("1. PK-251201-0002 - Ana Soto (Santiago)"));
        assert!(text.ends_with("_(Mostrando los últimos 10 de 12 total)_"));
    }

    #[test]
    fn dashboard_keywords() {
        let (name, text) = ask("muéstrame las estadísticas", &records(2));
        assert_eq!(name, Some("dashboard"));
        assert!(text.contains("📦 **Total de paquetes:** 2"));
    }
}
