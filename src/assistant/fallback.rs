//! Language-model fallback for questions no recognizer answers.

use std::fmt::Write;
use std::path::Path;

use tracing::{debug, warn};

use super::intents::last_n;
use super::prompt;
use crate::llm::LlmProvider;
use crate::package::PackageRecord;

/// Short description of the snapshot given to the model: the total, the
/// most recent `limit` records one per line, and how many were left out.
pub fn build_context(records: &[PackageRecord], limit: usize) -> String {
    let mut out = format!("Tienes acceso a {} paquetes registrados en total.\n", records.len());
    if records.is_empty() {
        out.push_str("\nNo hay paquetes registrados aún.");
        return out;
    }

    let shown = last_n(records, limit);
    let _ = writeln!(out, "\nTODOS los registros (mostrando {} más recientes):", shown.len());
    for (i, r) in shown.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. Código: {}, Destinatario: {}, Sucursal: {}, Tipo: {}, Fecha: {} {}",
            i + 1,
            r.pickup_code,
            r.recipient_name,
            r.branch,
            r.document_type,
            r.received_date,
            r.received_time
        );
    }
    let omitted = records.len() - shown.len();
    if omitted > 0 {
        let _ = writeln!(out, "\n(Hay {omitted} paquetes más antiguos no mostrados aquí)");
    }
    out
}

/// Ask the model. Provider failures become a reply telling the person to
/// rephrase.
pub async fn respond(
    llm: &LlmProvider,
    prompts_dir: &Path,
    question: &str,
    records: &[PackageRecord],
    limit: usize,
) -> String {
    let system = prompt::fallback_system(prompts_dir, &build_context(records, limit));
    match llm.complete(question, Some(&system)).await {
        Ok(resp) => {
            if let Some(usage) = resp.usage {
                debug!(
                    provider = llm.name(),
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "fallback answered"
                );
            }
            resp.text
        }
        Err(e) => {
            warn!(provider = llm.name(), error = %e, "fallback failed");
            format!(
                "❌ Error al procesar con IA: {e}\n\n\
                 Puedes intentar reformular tu pregunta o usar las pestañas de Consultar e Historial."
            )
        }
    }
}
