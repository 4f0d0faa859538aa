//! Closed vocabularies the recognizers match against.
//!
//! Branch names ship with built-in defaults and can be replaced from the
//! `[assistant]` config section without a rebuild.

use crate::config::AssistantConfig;

/// Branch names recognised by the branch query, lowercase. Longer names
/// come before their prefixes so "viña del mar" wins over "viña".
pub const DEFAULT_BRANCHES: &[&str] = &[
    "santiago",
    "viña del mar",
    "viña",
    "valparaíso",
    "valparaiso",
    "concepción",
    "concepcion",
    "temuco",
    "antofagasta",
    "la serena",
    "iquique",
    "puerto montt",
];

/// Branch names checked literally as a last resort, uppercase.
pub const DEFAULT_FIXED_BRANCHES: &[&str] = &["SANTIAGO", "VIÑA DEL MAR", "CONCEPCIÓN", "LA SERENA"];

/// Example questions shown next to the chat box.
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "¿Qué se registró el 1 de diciembre?",
    "¿Cuántos cheques hay registrados?",
    "Muéstrame los paquetes de Santiago",
    "¿Qué paquetes tiene Victor?",
    "Generar dashboard",
    "Listar paquetes por sucursal",
    "¿Cuántas facturas hay?",
    "Enviar recordatorio a Victor",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub branches: Vec<String>,
    pub fixed_branches: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            branches: DEFAULT_BRANCHES.iter().map(|s| s.to_string()).collect(),
            fixed_branches: DEFAULT_FIXED_BRANCHES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&AssistantConfig> for Catalog {
    fn from(cfg: &AssistantConfig) -> Self {
        Self { branches: cfg.branches.clone(), fixed_branches: cfg.fixed_branches.clone() }
    }
}
