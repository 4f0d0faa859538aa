//! Bulk and single reminder requests.
//!
//! Neither handler sends anything. They resolve who should be reminded and
//! return a [`ReminderPlan`]; the caller dispatches and then renders the
//! plan together with the [`Dispatch`] results.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;

use crate::assistant::matcher::{Outcome, Query};
use crate::assistant::text;
use crate::notify::Dispatch;

const BULK_TRIGGERS: &[&str] =
    &["enviar alertas", "alertar a todos", "notificar a todos", "recordar a todos", "avisar a todos"];

/// Wording that turns a question into a single reminder request.
pub(crate) const SINGLE_TRIGGERS: &[&str] = &[
    "recordatorio",
    "recordar",
    "avisar",
    "notificar",
    "enviar correo",
    "enviar email",
    "enviar recordatorio",
    "enviales",
];

const NAME_STOPWORDS: &[&str] = &[
    "que", "hay", "un", "paquete", "aun", "para", "a", "de", "el", "la", "los", "las", "recordatorio", "recordar",
    "avisar", "notificar", "enviar", "correo", "email", "le", "enviales",
];

const UNKNOWN_NAME: &str = "Usuario";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("static regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Who to remind, as resolved from the question.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderPlan {
    /// Every distinct recipient in the snapshot.
    Everyone(Vec<Recipient>),
    /// An address typed in the question.
    Direct(Recipient),
    /// The single recipient whose name matched.
    Matched { recipient: Recipient, pickup_code: String, branch: String },
}

impl ReminderPlan {
    /// Recipients in send order.
    pub fn recipients(&self) -> Vec<&Recipient> {
        match self {
            ReminderPlan::Everyone(all) => all.iter().collect(),
            ReminderPlan::Direct(r) | ReminderPlan::Matched { recipient: r, .. } => vec![r],
        }
    }

    /// Reply text once `results` (one per recipient, same order) are known.
    pub fn render(&self, results: &[Dispatch]) -> String {
        match self {
            ReminderPlan::Everyone(all) => {
                let mut out = format!("📧 **Enviando alertas a {} destinatario(s)...**\n\n", all.len());
                let mut ok = 0;
                for (r, d) in all.iter().zip(results) {
                    let mark = if d.success {
                        ok += 1;
                        "✅"
                    } else {
                        "❌"
                    };
                    let _ = writeln!(out, "{mark} {} ({})", r.name, r.email);
                }
                let failed = results.len() - ok;
                let _ = write!(out, "\n**Resumen:**\n✅ Exitosos: {ok}\n❌ Fallidos: {failed}\n");
                out
            }
            ReminderPlan::Direct(_) => results.first().map(|d| d.message.clone()).unwrap_or_default(),
            ReminderPlan::Matched { recipient, pickup_code, branch } => {
                let mut out = format!(
                    "🔍 **Destinatario encontrado:**\n- **Nombre:** {}\n- **Email:** {}\n- **Código:** {pickup_code}\n- **Sucursal:** {branch}\n\n",
                    recipient.name, recipient.email
                );
                if let Some(d) = results.first() {
                    out.push_str(&d.message);
                }
                out
            }
        }
    }
}

// ── bulk ──────────────────────────────────────────────────────────────────────

pub fn bulk_applies(q: &Query<'_>) -> bool {
    q.has_any(BULK_TRIGGERS)
}

/// One recipient per distinct email; the first name seen wins.
pub fn bulk(q: &Query<'_>) -> Option<Outcome> {
    if q.records.is_empty() {
        return Some(Outcome::Reply("📭 No hay paquetes para enviar alertas.".to_string()));
    }
    let mut seen = HashSet::new();
    let everyone: Vec<Recipient> = q
        .records
        .iter()
        .filter(|r| !r.recipient_email.trim().is_empty())
        .filter(|r| seen.insert(r.recipient_email.to_lowercase()))
        .map(|r| Recipient { name: r.recipient_name.clone(), email: r.recipient_email.clone() })
        .collect();
    Some(Outcome::Remind(ReminderPlan::Everyone(everyone)))
}

// ── single ────────────────────────────────────────────────────────────────────

pub fn single_applies(q: &Query<'_>) -> bool {
    q.has_any(SINGLE_TRIGGERS)
}

pub fn single(q: &Query<'_>) -> Option<Outcome> {
    if let Some(m) = email_regex().find(q.text) {
        let email = m.as_str().to_string();
        let name = q
            .records
            .iter()
            .find(|r| r.recipient_email.eq_ignore_ascii_case(&email))
            .map_or_else(|| UNKNOWN_NAME.to_string(), |r| r.recipient_name.clone());
        return Some(Outcome::Remind(ReminderPlan::Direct(Recipient { name, email })));
    }

    let needles: Vec<&str> = text::tokens(&q.lower, NAME_STOPWORDS).into_iter().filter(|t| text::searchable(t)).collect();
    let mut seen = HashSet::new();
    let matches: Vec<_> = q
        .records
        .iter()
        .filter(|r| !r.recipient_email.trim().is_empty())
        .filter(|r| {
            let name = r.recipient_name.to_lowercase();
            needles.iter().any(|n| name.contains(n))
        })
        .filter(|r| seen.insert(r.recipient_email.to_lowercase()))
        .collect();

    let outcome = match matches.as_slice() {
        [] => Outcome::Reply(
            "❌ No encontré ningún destinatario con ese nombre.\n\n\
             💡 **Opciones:**\n\
             1. Intenta con otro nombre\n\
             2. Usa el email directo: 'enviar recordatorio a nombre@empresa.cl'\n\
             3. Consulta la lista de destinatarios con: 'listar paquetes'"
                .to_string(),
        ),
        [only] => Outcome::Remind(ReminderPlan::Matched {
            recipient: Recipient { name: only.recipient_name.clone(), email: only.recipient_email.clone() },
            pickup_code: only.pickup_code.clone(),
            branch: only.branch.clone(),
        }),
        many => {
            let mut out = format!("🔍 **Encontré {} destinatarios:**\n\n", many.len());
            for (i, r) in many.iter().enumerate() {
                let _ = write!(
                    out,
                    "{}. **{}** ({})\n   - Código: {}\n   - Sucursal: {}\n\n",
                    i + 1,
                    r.recipient_name,
                    r.recipient_email,
                    r.pickup_code,
                    r.branch
                );
            }
            let _ = write!(
                out,
                "💡 **Enviar recordatorio a uno específico:**\nEscribe: 'enviar recordatorio a {}'",
                many[0].recipient_email
            );
            Outcome::Reply(out)
        }
    };
    Some(outcome)
}
