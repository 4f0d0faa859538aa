//! HTML bodies for the arrival and reminder emails, and the chat line.

use crate::package::{DocumentType, PackageRecord};

const PICKUP_HOURS: &str = "• Lunes a Jueves: hasta 18:00 hrs<br>\n                • Viernes: hasta 17:00 hrs";

/// Subject of the arrival email.
pub fn arrival_subject(record: &PackageRecord) -> String {
    format!("Recepción de paquete — {} — {}", record.recipient_name, record.branch)
}

/// "Correspondence has arrived" email for a freshly registered package.
/// Check amount and due date rows appear only for checks that carry them.
pub fn arrival_email(record: &PackageRecord, signature: &str) -> String {
    let mut rows = vec![
        row("🚚 Proveedor", &record.provider),
        row("📄 Tipo de Documento", record.document_type.label()),
        row("🔢 Número de Documento", &record.document_number),
    ];
    if record.document_type == DocumentType::Check {
        if let Some(amount) = record.check_amount.as_deref().filter(|s| !s.is_empty()) {
            rows.push(row("💰 Monto del Cheque", amount));
        }
        if let Some(due) = record.check_due_date.as_deref().filter(|s| !s.is_empty()) {
            rows.push(row("📆 Fecha de Vencimiento", due));
        }
    }
    rows.push(row("📅 Fecha de Recepción", &record.received_date));
    rows.push(row("🕐 Hora de Recepción", &record.received_time));

    page(
        "#4a5568",
        "📦 Recepción de Correspondencia",
        &format!(
            r#"<p>Estimado(a) <strong>{name}</strong>,</p>
            <p>Ha llegado correspondencia a su nombre:</p>
            <table class="info-table">
{rows}
            </table>
            <div class="important">
                <strong>🚩 Importante:</strong> Retiro mismo día de notificación<br>
                {PICKUP_HOURS}
            </div>"#,
            name = escape(&record.recipient_name),
            rows = rows.join("\n"),
        ),
        signature,
    )
}

/// "Please come and collect" email.
pub fn reminder_email(name: &str, signature: &str) -> String {
    page(
        "#e65100",
        "⏰ Recordatorio de Retiro",
        &format!(
            r#"<p>Estimado(a) <strong>{name}</strong>,</p>
            <div class="important">
                <strong>🚨 Recordatorio:</strong><br><br>
                Tiene correspondencia pendiente de retiro en Recepción.<br><br>
                Por favor, recuerde retirarla durante el horario de atención:<br>
                {PICKUP_HOURS}
            </div>"#,
            name = escape(name),
        ),
        signature,
    )
}

/// One-line chat message announcing an arrival.
pub fn arrival_chat_line(record: &PackageRecord) -> String {
    format!(
        "📦 Paquete para {} ({}). Proveedor: {}. Doc: {} {}. Código: {}. Sucursal: {}.",
        record.recipient_name,
        record.recipient_email,
        record.provider,
        record.document_type,
        record.document_number,
        record.pickup_code,
        record.branch,
    )
}

fn row(label: &str, value: &str) -> String {
    format!("                <tr><td>{label}</td><td>{}</td></tr>", escape(value))
}

fn page(accent: &str, title: &str, body: &str, signature: &str) -> String {
    let signature = signature
        .lines()
        .map(escape)
        .collect::<Vec<_>>()
        .join("<br>\n                ");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.4; color: #333; max-width: 550px; margin: 0 auto; }}
        .header {{ background: {accent}; color: white; padding: 15px; text-align: center; }}
        .header h2 {{ margin: 0; font-size: 18px; }}
        .content {{ padding: 20px; background: #f9f9f9; }}
        .info-table {{ width: 100%; margin: 15px 0; background: white; border: 1px solid #ddd; }}
        .info-table td {{ padding: 8px 12px; border-bottom: 1px solid #eee; font-size: 14px; }}
        .info-table td:first-child {{ font-weight: 600; color: #4a5568; width: 35%; }}
        .important {{ background: #fff3cd; border-left: 3px solid #ff9800; padding: 12px; margin: 15px 0; font-size: 13px; }}
        .footer {{ margin-top: 15px; font-size: 13px; color: #666; }}
    </style>
</head>
<body>
    <div class="header"><h2>{title}</h2></div>
    <div class="content">
            {body}
        <div class="footer">
            <p>De antemano, muchas gracias.</p>
            <p>{signature}</p>
        </div>
    </div>
</body>
</html>
"#
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_rows_only_for_checks_with_values() {
        let mut rec = PackageRecord::sample("PK-251201-CH01", "Juan Perez", "Santiago", DocumentType::Check);
        rec.check_amount = Some("$10.000".into());
        let html = arrival_email(&rec, "Recepción");
        assert!(html.contains("Monto del Cheque"));
        assert!(html.contains("$10.000"));
        assert!(!html.contains("Fecha de Vencimiento"));

        let mut inv = rec.clone();
        inv.document_type = DocumentType::Invoice;
        assert!(!arrival_email(&inv, "Recepción").contains("Monto del Cheque"));
    }

    #[test]
    fn names_are_escaped() {
        let html = reminder_email("<b>Ana</b> & Co", "Recepción");
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt; &amp; Co"));
        assert!(!html.contains("<b>Ana</b>"));
    }

    #[test]
    fn signature_lines_become_breaks() {
        let html = reminder_email("Ana", "Rosa Díaz\nRecepcionista");
        assert!(html.contains("Rosa Díaz<br>"));
        assert!(html.contains("Recepcionista"));
    }

    #[test]
    fn chat_line_names_code_and_branch() {
        let rec = PackageRecord::sample("PK-251201-TM01", "Ana Soto", "Temuco", DocumentType::Guide);
        let line = arrival_chat_line(&rec);
        assert!(line.starts_with("📦 Paquete para Ana Soto (ana.soto@example.cl)."));
        assert!(line.contains("Código: PK-251201-TM01. Sucursal: Temuco."));
    }
}
