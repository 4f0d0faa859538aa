//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `RECEPCION_DATA_DIR` and `RECEPCION_LOG_LEVEL` overrides.
//! Secrets (API keys, client secrets, webhook URLs) are only ever read from
//! the environment, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::assistant::catalog;
use crate::error::AppError;

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
}

/// HTTP channel configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    /// Socket address to bind the HTTP channel to.
    pub bind: String,
}

#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub pty: PtyConfig,
    pub http: HttpConfig,
}

/// OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider (`"dummy"`, `"openai"`).
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Microsoft Graph mail + Teams webhook credentials, all from env.
#[derive(Debug, Clone, Default)]
pub struct GraphCredentials {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Mailbox the messages are sent from.
    pub sender_upn: Option<String>,
    pub teams_webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Active dispatcher (`"outbox"`, `"graph"`).
    pub dispatcher: String,
    pub mail_timeout_seconds: u64,
    pub webhook_timeout_seconds: u64,
    /// Sign-off block appended to every email.
    pub signature: String,
    pub credentials: GraphCredentials,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub prompts_dir: PathBuf,
    /// Maximum turns kept per conversation.
    pub transcript_cap: usize,
    /// Maximum conversations kept; the least recently used is dropped.
    pub max_sessions: usize,
    /// Records handed to the language model as context, `1..=50`.
    pub context_limit: usize,
    /// Branch names the branch query recognises (lowercase).
    pub branches: Vec<String>,
    /// Branch names checked literally as a last resort (uppercase).
    pub fixed_branches: Vec<String>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Directory for all persistent data (already expanded, no `~`).
    pub data_dir: PathBuf,
    pub log_level: String,
    /// SQLite database path (absolute, or joined onto `data_dir`).
    pub db_path: PathBuf,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY`; `None` for keyless local models.
    pub llm_api_key: Option<String>,
    pub notify: NotifyConfig,
    pub assistant: AssistantConfig,
}

impl Config {
    pub fn comms_pty_should_load(&self) -> bool {
        self.comms.pty.enabled
    }

    pub fn comms_http_should_load(&self) -> bool {
        self.comms.http.enabled
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    service: RawService,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    notify: RawNotify,
    #[serde(default)]
    assistant: RawAssistant,
}

#[derive(Deserialize)]
struct RawService {
    name: String,
    data_dir: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawStore {
    #[serde(default = "default_db_file")]
    db_file: String,
}

impl Default for RawStore {
    fn default() -> Self {
        Self { db_file: default_db_file() }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize, Default)]
struct RawPty {
    /// Defaults to `false`: the console must be explicitly enabled.
    #[serde(default)]
    enabled: bool,
}

#[derive(Deserialize)]
struct RawHttp {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { enabled: true, bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawNotify {
    #[serde(rename = "default", default = "default_dispatcher")]
    dispatcher: String,
    #[serde(default = "default_mail_timeout")]
    mail_timeout_seconds: u64,
    #[serde(default = "default_webhook_timeout")]
    webhook_timeout_seconds: u64,
    #[serde(default = "default_signature")]
    signature: String,
}

impl Default for RawNotify {
    fn default() -> Self {
        Self {
            dispatcher: default_dispatcher(),
            mail_timeout_seconds: default_mail_timeout(),
            webhook_timeout_seconds: default_webhook_timeout(),
            signature: default_signature(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawAssistant {
    prompts_dir: Option<String>,
    transcript_cap: Option<usize>,
    max_sessions: Option<usize>,
    context_limit: Option<usize>,
    branches: Option<Vec<String>>,
    fixed_branches: Option<Vec<String>>,
}

fn default_db_file() -> String { "paquetes.db".to_string() }
fn default_http_bind() -> String { "127.0.0.1:8000".to_string() }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_openai_temperature() -> f32 { 0.7 }
fn default_openai_max_tokens() -> u32 { 500 }
fn default_openai_timeout_seconds() -> u64 { 30 }
fn default_dispatcher() -> String { "outbox".to_string() }
fn default_mail_timeout() -> u64 { 30 }
fn default_webhook_timeout() -> u64 { 15 }
fn default_signature() -> String { "Recepción".to_string() }
fn default_true() -> bool { true }

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const DEFAULT_TRANSCRIPT_CAP: usize = 200;
const DEFAULT_MAX_SESSIONS: usize = 500;
const DEFAULT_CONTEXT_LIMIT: usize = 50;
const MAX_CONTEXT_LIMIT: usize = 50;

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let data_dir_override = env::var("RECEPCION_DATA_DIR").ok();
    let log_level_override = env::var("RECEPCION_LOG_LEVEL").ok();
    load_from(
        Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH)),
        data_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let s = parsed.service;
    let data_dir = expand_home(data_dir_override.unwrap_or(&s.data_dir));
    let log_level = log_level_override.unwrap_or(&s.log_level).to_string();

    let db_path = PathBuf::from(&parsed.store.db_file);
    let db_path = if db_path.is_absolute() { db_path } else { data_dir.join(db_path) };

    if parsed.comms.http.enabled && parsed.comms.http.bind.trim().is_empty() {
        return Err(AppError::Config("comms.http.bind must not be empty".into()));
    }

    let a = parsed.assistant;
    let context_limit = a.context_limit.unwrap_or(DEFAULT_CONTEXT_LIMIT);
    if !(1..=MAX_CONTEXT_LIMIT).contains(&context_limit) {
        return Err(AppError::Config(format!(
            "assistant.context_limit must be between 1 and {MAX_CONTEXT_LIMIT}, got {context_limit}"
        )));
    }
    let max_sessions = a.max_sessions.unwrap_or(DEFAULT_MAX_SESSIONS);
    if max_sessions == 0 {
        return Err(AppError::Config("assistant.max_sessions must be at least 1".into()));
    }
    let assistant = AssistantConfig {
        prompts_dir: a.prompts_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("config/prompts")),
        transcript_cap: a.transcript_cap.unwrap_or(DEFAULT_TRANSCRIPT_CAP),
        max_sessions,
        context_limit,
        branches: a
            .branches
            .map(|v| v.into_iter().map(|b| b.to_lowercase()).collect())
            .unwrap_or_else(|| to_owned(catalog::DEFAULT_BRANCHES)),
        fixed_branches: a
            .fixed_branches
            .map(|v| v.into_iter().map(|b| b.to_uppercase()).collect())
            .unwrap_or_else(|| to_owned(catalog::DEFAULT_FIXED_BRANCHES)),
    };

    Ok(Config {
        name: s.name,
        data_dir,
        log_level,
        db_path,
        comms: CommsConfig {
            pty: PtyConfig { enabled: parsed.comms.pty.enabled },
            http: HttpConfig {
                enabled: parsed.comms.http.enabled,
                bind: parsed.comms.http.bind,
            },
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                max_tokens: parsed.llm.openai.max_tokens,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env_nonempty("LLM_API_KEY"),
        notify: NotifyConfig {
            dispatcher: parsed.notify.dispatcher,
            mail_timeout_seconds: parsed.notify.mail_timeout_seconds,
            webhook_timeout_seconds: parsed.notify.webhook_timeout_seconds,
            signature: parsed.notify.signature,
            credentials: GraphCredentials {
                tenant_id: env_nonempty("GRAPH_TENANT_ID"),
                client_id: env_nonempty("GRAPH_CLIENT_ID"),
                client_secret: env_nonempty("GRAPH_CLIENT_SECRET"),
                sender_upn: env_nonempty("GRAPH_SENDER_UPN"),
                teams_webhook_url: env_nonempty("TEAMS_WEBHOOK_URL"),
            },
        },
        assistant,
    })
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests: dummy LLM, outbox dispatcher, no secrets.
#[cfg(test)]
impl Config {
    pub fn test_default(data_dir: &Path) -> Self {
        Self {
            name: "test".into(),
            data_dir: data_dir.to_path_buf(),
            log_level: "info".into(),
            db_path: data_dir.join("paquetes.db"),
            comms: CommsConfig {
                pty: PtyConfig { enabled: false },
                http: HttpConfig { enabled: false, bind: default_http_bind() },
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    max_tokens: 64,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            notify: NotifyConfig {
                dispatcher: "outbox".into(),
                mail_timeout_seconds: 1,
                webhook_timeout_seconds: 1,
                signature: default_signature(),
                credentials: GraphCredentials::default(),
            },
            assistant: AssistantConfig {
                prompts_dir: PathBuf::from("config/prompts"),
                transcript_cap: 20,
                max_sessions: 16,
                context_limit: DEFAULT_CONTEXT_LIMIT,
                branches: to_owned(catalog::DEFAULT_BRANCHES),
                fixed_branches: to_owned(catalog::DEFAULT_FIXED_BRANCHES),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[service]
name = "desk"
data_dir = "~/.recepcion"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.name, "desk");
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.notify.dispatcher, "outbox");
        assert!(cfg.comms_http_should_load());
        assert!(!cfg.comms_pty_should_load());
        assert_eq!(cfg.assistant.context_limit, 50);
        assert_eq!(cfg.assistant.max_sessions, 500);
        assert!(cfg.assistant.branches.contains(&"santiago".to_string()));
        assert!(cfg.db_path.ends_with("paquetes.db"));
    }

    #[test]
    fn branch_lists_can_be_overridden() {
        let f = write_toml(&format!(
            "{MINIMAL_TOML}\n[assistant]\nbranches = [\"Rancagua\"]\nfixed_branches = [\"rancagua\"]\n"
        ));
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.assistant.branches, vec!["rancagua".to_string()]);
        assert_eq!(cfg.assistant.fixed_branches, vec!["RANCAGUA".to_string()]);
    }

    #[test]
    fn relative_db_file_joins_data_dir() {
        let f = write_toml(&format!("{MINIMAL_TOML}\n[store]\ndb_file = \"x.db\"\n"));
        let cfg = load_from(f.path(), Some("/tmp/desk"), None).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/desk/x.db"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.recepcion");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".recepcion"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_overrides_apply() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/test-override"), Some("debug")).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/test-override"));
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn empty_bind_rejected() {
        let f = write_toml(&format!("{MINIMAL_TOML}\n[comms.http]\nbind = \"\"\n"));
        assert!(load_from(f.path(), None, None).is_err());
    }

    #[test]
    fn context_limit_out_of_range_rejected() {
        for bad in [0, 51, 500] {
            let f = write_toml(&format!("{MINIMAL_TOML}\n[assistant]\ncontext_limit = {bad}\n"));
            let msg = load_from(f.path(), None, None).unwrap_err().to_string();
            assert!(msg.contains("context_limit"), "{bad}: {msg}");
        }
        let f = write_toml(&format!("{MINIMAL_TOML}\n[assistant]\ncontext_limit = 20\n"));
        assert_eq!(load_from(f.path(), None, None).unwrap().assistant.context_limit, 20);
    }

    #[test]
    fn zero_sessions_rejected() {
        let f = write_toml(&format!("{MINIMAL_TOML}\n[assistant]\nmax_sessions = 0\n"));
        assert!(load_from(f.path(), None, None).is_err());
    }
}
