//! Branch and document-type questions, plus the literal last-resort lists.

use std::fmt::Write;

use super::{LIST_LIMIT, NO_RECORDS, last_n, truncation_footer};
use crate::aggregate::group_counts;
use crate::assistant::matcher::{Outcome, Query};
use crate::assistant::text;
use crate::package::fields::Field;
use crate::package::{DocumentType, PackageRecord};

const BRANCH_TRIGGERS: &[&str] = &["sucursal", "sucursales", "oficina", "local"];

const DOCUMENT_TRIGGERS: &[&str] = &[
    "tipo de documento",
    "tipo documento",
    "cheque",
    "factura",
    "guía",
    "guia",
    "orden de trabajo",
    "ordenes de trabajo",
];

/// Substrings naming a specific type, checked in order.
const DOCUMENT_SYNONYMS: &[(&str, DocumentType)] = &[
    ("cheque", DocumentType::Check),
    ("factura", DocumentType::Invoice),
    ("guía", DocumentType::Guide),
    ("guia", DocumentType::Guide),
    ("orden de trabajo", DocumentType::WorkOrder),
    ("ordenes de trabajo", DocumentType::WorkOrder),
];

/// Last-resort type names. Two-letter `ot` only matches as a whole word.
const FIXED_DOCUMENT_TYPES: &[(DocumentType, &[&str])] = &[
    (DocumentType::Check, &["cheque", "cheques"]),
    (DocumentType::Invoice, &["factura", "facturas"]),
    (DocumentType::Guide, &["guia", "guía", "guias", "guías"]),
    (DocumentType::WorkOrder, &["orden de trabajo", "orden trabajo"]),
    (DocumentType::Other, &["otro", "otros"]),
];

fn plural(t: DocumentType) -> &'static str {
    match t {
        DocumentType::Guide => "Guías",
        DocumentType::Invoice => "Facturas",
        DocumentType::Check => "Cheques",
        DocumentType::WorkOrder => "Órdenes de trabajo",
        DocumentType::Other => "Otros",
    }
}

fn counts_by(records: &[PackageRecord], field: Field, title: &str, example: &str) -> String {
    let counts = group_counts(records, field);
    if counts.is_empty() {
        return NO_RECORDS.to_string();
    }
    let mut out = format!("{title}\n\n");
    for (key, n) in counts {
        let _ = writeln!(out, "• **{key}**: {n} paquete(s)");
    }
    let _ = write!(out, "\n💡 Ejemplo: '{example}'");
    out
}

// ── branch ────────────────────────────────────────────────────────────────────

pub fn branch_applies(q: &Query<'_>) -> bool {
    q.has_any(BRANCH_TRIGGERS)
}

pub fn branch(q: &Query<'_>) -> Option<Outcome> {
    let Some(wanted) = q.catalog.branches.iter().find(|b| q.has(b)) else {
        return Some(Outcome::Reply(counts_by(
            q.records,
            Field::Branch,
            "📍 **Paquetes por sucursal:**",
            "¿Cuántos paquetes hay en Santiago?",
        )));
    };

    let folded = text::fold(wanted);
    let label = text::title_case(wanted);
    let hits: Vec<&PackageRecord> = q.records.iter().filter(|r| text::fold(&r.branch) == folded).collect();
    if hits.is_empty() {
        return Some(Outcome::Reply(format!("{NO_RECORDS} en sucursal '{label}'")));
    }

    let mut out = format!("📍 **Paquetes en sucursal '{label}':** {}\n\n", hits.len());
    for (i, r) in last_n(&hits, LIST_LIMIT).iter().enumerate() {
        let _ = write!(
            out,
            "{}. **{}** - {}\n   Tipo: {} | Fecha: {}\n\n",
            i + 1,
            r.pickup_code,
            r.recipient_name,
            r.document_type,
            r.received_date
        );
    }
    if let Some(footer) = truncation_footer(hits.len()) {
        out.push_str(&footer);
    }
    Some(Outcome::Reply(out))
}

// ── document type ─────────────────────────────────────────────────────────────

pub fn document_type_applies(q: &Query<'_>) -> bool {
    q.has_any(DOCUMENT_TRIGGERS)
}

pub fn document_type(q: &Query<'_>) -> Option<Outcome> {
    let Some(&(_, wanted)) = DOCUMENT_SYNONYMS.iter().find(|(kw, _)| q.has(kw)) else {
        return Some(Outcome::Reply(counts_by(
            q.records,
            Field::DocumentType,
            "📄 **Paquetes por tipo de documento:**",
            "¿Cuántos cheques hay?",
        )));
    };

    let hits: Vec<&PackageRecord> = q.records.iter().filter(|r| r.document_type == wanted).collect();
    if hits.is_empty() {
        return Some(Outcome::Reply(format!(
            "📭 No hay {} registrados",
            plural(wanted).to_lowercase()
        )));
    }

    let mut out = format!("📄 **{} registrados:** {}\n\n", plural(wanted), hits.len());
    for (i, r) in last_n(&hits, LIST_LIMIT).iter().enumerate() {
        let _ = writeln!(out, "{}. **{}** - {}", i + 1, r.pickup_code, r.recipient_name);
        let _ = writeln!(out, "   Sucursal: {} | Fecha: {}", r.branch, r.received_date);
        check_lines(&mut out, r, "   ");
        out.push('\n');
    }
    if let Some(footer) = truncation_footer(hits.len()) {
        out.push_str(&footer);
    }
    Some(Outcome::Reply(out))
}

fn check_lines(out: &mut String, r: &PackageRecord, indent: &str) {
    if r.document_type != DocumentType::Check {
        return;
    }
    if let Some(amount) = r.check_amount.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "{indent}💵 Monto: {amount}");
    }
    if let Some(due) = r.check_due_date.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "{indent}📆 Vencimiento: {due}");
    }
}

// ── fixed lists ───────────────────────────────────────────────────────────────

pub fn fixed_applies(q: &Query<'_>) -> bool {
    fixed_branch(q).is_some() || fixed_document_type(q).is_some()
}

fn fixed_branch<'c>(q: &Query<'c>) -> Option<&'c str> {
    q.catalog
        .fixed_branches
        .iter()
        .find(|b| {
            let lower = b.to_lowercase();
            q.has(&lower) || q.has(&lower.replace(' ', ""))
        })
        .map(String::as_str)
}

fn fixed_document_type(q: &Query<'_>) -> Option<DocumentType> {
    if text::contains_word(&q.lower, "ot") {
        return Some(DocumentType::WorkOrder);
    }
    FIXED_DOCUMENT_TYPES
        .iter()
        .find(|(_, variants)| q.has_any(variants))
        .map(|&(t, _)| t)
}

pub fn fixed(q: &Query<'_>) -> Option<Outcome> {
    if let Some(branch) = fixed_branch(q) {
        let n = q.records.iter().filter(|r| r.branch.to_uppercase() == branch).count();
        let text = if n > 0 {
            format!("📍 Hay **{n} paquete(s)** en {branch}.")
        } else {
            format!("📍 No hay paquetes registrados en {branch}.")
        };
        return Some(Outcome::Reply(text));
    }

    let wanted = fixed_document_type(q)?;
    let label = wanted.label().to_uppercase();
    let hits: Vec<&PackageRecord> = q.records.iter().filter(|r| r.document_type == wanted).collect();
    if hits.is_empty() {
        return Some(Outcome::Reply(format!(
            "📭 No hay paquetes con tipo de documento '{label}' registrados."
        )));
    }

    let mut out = format!("💰 Encontré **{} paquete(s)** con tipo de documento '{label}':\n\n", hits.len());
    for r in hits {
        let _ = writeln!(out, "- **{}**: {}", r.pickup_code, r.recipient_name);
        let _ = writeln!(out, "  📄 Documento: {}", r.document_number);
        let _ = writeln!(out, "  🚚 Proveedor: {}", r.provider);
        check_lines(&mut out, r, "  ");
        out.push('\n');
    }
    Some(Outcome::Reply(out))
}
