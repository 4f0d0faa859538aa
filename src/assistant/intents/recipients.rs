//! "Which packages are for Maria?"

use std::fmt::Write;

use crate::assistant::matcher::{Outcome, Query};
use crate::assistant::text;
use crate::package::PackageRecord;

const TRIGGERS: &[&str] = &["destinatario", "para quien", "para quién", "destinado a", "paquete de", "paquetes de"];

const STOPWORDS: &[&str] = &[
    "que", "hay", "un", "el", "la", "los", "las", "para", "quien", "quién", "es", "son", "paquete", "paquetes",
    "destinatario", "destinatarios", "de", "del", "a", "tiene",
];

const MAX_RECIPIENTS: usize = 5;
const MAX_PER_RECIPIENT: usize = 3;

/// Words after which the next word is read as a name.
const NAME_MARKERS: &[&str] = &["destinatario", "nombre", "para", "de"];

pub fn applies(q: &Query<'_>) -> bool {
    q.has_any(TRIGGERS)
}

/// Grouped recipient search. Falls through when nothing matches.
pub fn handle(q: &Query<'_>) -> Option<Outcome> {
    let needles: Vec<&str> = text::tokens(&q.lower, STOPWORDS).into_iter().filter(|t| text::searchable(t)).collect();

    let hits: Vec<&PackageRecord> = q
        .records
        .iter()
        .filter(|r| {
            let name = r.recipient_name.to_lowercase();
            needles.iter().any(|n| name.contains(n))
        })
        .collect();
    if hits.is_empty() {
        return None;
    }

    let mut groups: Vec<(&str, Vec<&PackageRecord>)> = Vec::new();
    for r in hits {
        match groups.iter_mut().find(|(name, _)| *name == r.recipient_name) {
            Some((_, list)) => list.push(r),
            None => groups.push((&r.recipient_name, vec![r])),
        }
    }

    let mut out = format!("👤 **Destinatarios encontrados:** {}\n\n", groups.len());
    for (name, list) in groups.iter().take(MAX_RECIPIENTS) {
        let _ = writeln!(out, "**{name}** ({} paquete(s))", list.len());
        for (i, r) in list.iter().take(MAX_PER_RECIPIENT).enumerate() {
            let _ = writeln!(out, "  {}. {} - {} ({})", i + 1, r.pickup_code, r.document_type, r.received_date);
        }
        if list.len() > MAX_PER_RECIPIENT {
            let _ = writeln!(out, "  _(y {} más)_", list.len() - MAX_PER_RECIPIENT);
        }
        out.push('\n');
    }
    if groups.len() > MAX_RECIPIENTS {
        let _ = write!(out, "_(Mostrando {MAX_RECIPIENTS} de {} destinatarios)_", groups.len());
    }
    Some(Outcome::Reply(out))
}

pub fn word_applies(q: &Query<'_>) -> bool {
    q.has("destinatario") || q.has("nombre")
}

/// Reads the word right after "destinatario", "nombre", "para" or "de" and
/// lists every record whose recipient contains it.
pub fn by_word(q: &Query<'_>) -> Option<Outcome> {
    let words: Vec<&str> = q.text.split_whitespace().collect();
    for pair in words.windows(2) {
        if !NAME_MARKERS.contains(&pair[0].to_lowercase().as_str()) {
            continue;
        }
        let needle = text::strip_punct(pair[1]).to_lowercase();
        if needle.is_empty() {
            continue;
        }
        let hits: Vec<&PackageRecord> = q
            .records
            .iter()
            .filter(|r| r.recipient_name.to_lowercase().contains(&needle))
            .collect();
        if hits.is_empty() {
            continue;
        }
        let mut out = format!("🔍 Encontré **{} paquete(s)** con '{needle}':\n\n", hits.len());
        for r in hits {
            let _ = writeln!(out, "- {}: {} ({})", r.pickup_code, r.recipient_name, r.branch);
        }
        return Some(Outcome::Reply(out));
    }
    None
}
