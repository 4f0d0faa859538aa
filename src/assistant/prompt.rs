//! Layered system prompt for the language-model fallback.
//!
//! Layers are plain Markdown files under `config/prompts/`, appended in
//! order and joined by a blank line. A missing file is skipped so a
//! deployment may drop the persona layer.
//!
//! ```text
//! 0. id.md               persona of the desk assistant
//! 1. fallback_system.md  answering rules; {{context}} placeholder
//! ```
//!
//! `{{key}}` placeholders are substituted once, in [`PromptBuilder::build`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n";

pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self { prompts_dir: prompts_dir.into(), parts: Vec::new(), vars: HashMap::new() }
    }

    /// Append `filename` from the prompts directory, if it exists.
    pub fn layer(mut self, filename: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => self.push(&text),
            Err(_) => tracing::debug!(path = %path.display(), "prompt layer not found, skipped"),
        }
        self
    }

    /// Append an inline fragment.
    pub fn append(mut self, text: &str) -> Self {
        self.push(text);
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            prompt = prompt.replace(&format!("{{{{{k}}}}}"), v);
        }
        prompt
    }

    fn push(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
    }
}

/// Persona plus fallback rules with `context` substituted.
pub fn fallback_system(prompts_dir: impl AsRef<Path>, context: &str) -> String {
    PromptBuilder::new(prompts_dir.as_ref())
        .layer("id.md")
        .layer("fallback_system.md")
        .var("context", context)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_join_and_substitute() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "  Hola {{who}}  \n").unwrap();
        fs::write(dir.path().join("empty.md"), "\n\n").unwrap();
        let prompt = PromptBuilder::new(dir.path())
            .layer("a.md")
            .layer("empty.md")
            .layer("missing.md")
            .append("Fin {{who}}")
            .var("who", "Recepción")
            .build();
        assert_eq!(prompt, "Hola Recepción\n\nFin Recepción");
    }

    #[test]
    fn shipped_fallback_prompt_carries_context() {
        let prompts = concat!(env!("CARGO_MANIFEST_DIR"), "/config/prompts");
        let prompt = fallback_system(prompts, "Tienes acceso a 3 paquetes");
        assert!(prompt.contains("Tienes acceso a 3 paquetes"));
        assert!(!prompt.contains("{{context}}"));
    }
}
