//! Text layouts shared by several recognizers: the package detail card and
//! the dashboard.

use std::fmt::Write;

use crate::aggregate::Summary;
use crate::package::{DocumentType, PackageRecord};

const BAR: char = '█';
const BAR_CAP: usize = 20;
const DASHBOARD_TOP: usize = 5;

pub const NO_DASHBOARD_DATA: &str = "📭 No hay datos para generar el dashboard.";

/// `- **Label:** value` card with every identifying field of `record`.
pub fn detail_card(title: &str, record: &PackageRecord) -> String {
    let mut out = format!("{title}\n");
    let mut line = |label: &str, value: &str| {
        let _ = writeln!(out, "- **{label}:** {value}");
    };
    line("Código", &record.pickup_code);
    line("Destinatario", &record.recipient_name);
    line("Email", &record.recipient_email);
    line("Sucursal", &record.branch);
    line("Proveedor", &record.provider);
    line("Documento", &format!("{} - {}", record.document_type, record.document_number));
    line("Fecha", &format!("{} {}", record.received_date, record.received_time));
    if record.document_type == DocumentType::Check {
        if let Some(amount) = record.check_amount.as_deref() {
            line("Monto", amount);
        }
        if let Some(due) = record.check_due_date.as_deref() {
            line("Vencimiento", due);
        }
    }
    line("Estado", record.status.label());
    out
}

/// Short card for the most recent package.
pub fn latest_card(record: &PackageRecord) -> String {
    format!(
        "📦 **Último paquete registrado:**\n\
         - **Código:** {}\n\
         - **Destinatario:** {}\n\
         - **Sucursal:** {}\n\
         - **Fecha:** {} {}\n",
        record.pickup_code, record.recipient_name, record.branch, record.received_date, record.received_time
    )
}

/// Multi-section dashboard over the whole snapshot.
pub fn dashboard(records: &[PackageRecord]) -> String {
    if records.is_empty() {
        return NO_DASHBOARD_DATA.to_string();
    }
    let summary = Summary::from_records(records, DASHBOARD_TOP);

    let mut out = String::new();
    out.push_str("📊 **DASHBOARD DE PAQUETES**\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    let _ = writeln!(out, "📦 **Total de paquetes:** {}\n", summary.total);

    out.push_str("**📄 Por Tipo de Documento:**\n");
    histogram(&mut out, &summary.by_document_type);

    out.push_str("\n**📍 Por Sucursal:**\n");
    histogram(&mut out, &summary.by_branch);

    out.push_str("\n**👥 Top 5 Destinatarios:**\n");
    ranking(&mut out, &summary.top_recipients);

    out.push_str("\n**🚚 Top 5 Proveedores:**\n");
    ranking(&mut out, &summary.top_providers);
    out
}

fn histogram(out: &mut String, counts: &[(String, usize)]) {
    for (key, count) in counts {
        let bar: String = std::iter::repeat_n(BAR, (*count).min(BAR_CAP)).collect();
        let _ = writeln!(out, "  {key}: {bar} ({count})");
    }
}

fn ranking(out: &mut String, counts: &[(String, usize)]) {
    for (i, (key, count)) in counts.iter().enumerate() {
        let _ = writeln!(out, "  {}. {key}: {count} paquete(s)", i + 1);
    }
}

#[cfg(test)]
pub(crate) fn card_fields(card: &str) -> Vec<(String, String)> {
    card.lines()
        .filter_map(|l| l.strip_prefix("- **"))
        .filter_map(|l| l.split_once(":** "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
