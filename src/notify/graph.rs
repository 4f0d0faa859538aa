//! Microsoft Graph `sendMail` and directory search with a
//! client-credentials token, plus the Teams incoming webhook.
//!
//! The access token is cached until five minutes before it expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::NotifyError;
use super::directory::{self, DirectoryEntry};
use crate::config::{GraphCredentials, NotifyConfig};
use crate::error::AppError;

const LOGIN_BASE: &str = "https://login.microsoftonline.com";
const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct GraphList<T> {
    #[serde(default)]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    display_name: Option<String>,
    mail: Option<String>,
    user_principal_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphGroup {
    display_name: Option<String>,
    mail: Option<String>,
    #[serde(default)]
    mail_enabled: bool,
}

fn nonempty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct GraphDispatcher {
    mail_client: Client,
    webhook_client: Client,
    credentials: GraphCredentials,
    signature: String,
    login_base: String,
    graph_base: String,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl GraphDispatcher {
    pub fn new(config: &NotifyConfig) -> Result<Self, AppError> {
        let build = |secs: u64| {
            Client::builder()
                .timeout(Duration::from_secs(secs))
                .build()
                .map_err(|e| AppError::Comms(format!("failed to build HTTP client: {e}")))
        };
        Ok(Self {
            mail_client: build(config.mail_timeout_seconds)?,
            webhook_client: build(config.webhook_timeout_seconds)?,
            credentials: config.credentials.clone(),
            signature: config.signature.clone(),
            login_base: LOGIN_BASE.to_string(),
            graph_base: GRAPH_BASE.to_string(),
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Point the token and mail calls at other hosts (sovereign clouds, tests).
    pub fn with_endpoints(mut self, login_base: impl Into<String>, graph_base: impl Into<String>) -> Self {
        self.login_base = login_base.into();
        self.graph_base = graph_base.into();
        self
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub(super) async fn send_mail(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        let sender = self
            .credentials
            .sender_upn
            .as_deref()
            .ok_or(NotifyError::MissingCredentials("GRAPH_SENDER_UPN"))?;
        let token = self.access_token().await?;

        let payload = json!({
            "message": {
                "subject": subject,
                "body": { "contentType": "HTML", "content": html },
                "toRecipients": [ { "emailAddress": { "address": to } } ],
            },
            "saveToSentItems": "true",
        });

        let url = format!("{}/users/{sender}/sendMail", self.graph_base);
        let res = self
            .mail_client
            .post(&url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        match res.status() {
            StatusCode::ACCEPTED | StatusCode::OK => {
                debug!(%to, "graph: sendMail accepted");
                Ok(())
            }
            status => Err(NotifyError::Status(status.as_u16())),
        }
    }

    pub(super) async fn post_webhook(&self, text: &str) -> Result<(), NotifyError> {
        let url = self
            .credentials
            .teams_webhook_url
            .as_deref()
            .ok_or(NotifyError::MissingCredentials("TEAMS_WEBHOOK_URL"))?;
        let res = self
            .webhook_client
            .post(url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        match res.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => Err(NotifyError::Status(status.as_u16())),
        }
    }

    /// Users by name or address, then mail-enabled groups. A failed group
    /// search still returns the users.
    pub(super) async fn search_directory(&self, query: &str) -> Result<Vec<DirectoryEntry>, NotifyError> {
        let token = self.access_token().await?;
        let query = query.replace('"', "");
        let search = format!("\"displayName:{query}\" OR \"mail:{query}\"");
        let users_top = directory::MAX_USERS.to_string();
        let groups_top = directory::MAX_GROUPS.to_string();

        let users: GraphList<GraphUser> = self
            .directory_get(
                "users",
                &token,
                &[
                    ("$search", search.as_str()),
                    ("$select", "displayName,mail,userPrincipalName"),
                    ("$top", users_top.as_str()),
                ],
            )
            .await?;
        let mut found: Vec<DirectoryEntry> = users
            .value
            .into_iter()
            .filter_map(|u| {
                let email = nonempty(u.mail).or(nonempty(u.user_principal_name))?;
                Some(DirectoryEntry::user(nonempty(u.display_name)?, email))
            })
            .collect();

        let groups = self
            .directory_get::<GraphGroup>(
                "groups",
                &token,
                &[
                    ("$search", search.as_str()),
                    ("$filter", "mailEnabled eq true"),
                    ("$select", "displayName,mail,mailEnabled"),
                    ("$top", groups_top.as_str()),
                ],
            )
            .await;
        match groups {
            Ok(groups) => found.extend(
                groups
                    .value
                    .into_iter()
                    .filter(|g| g.mail_enabled)
                    .filter_map(|g| Some(DirectoryEntry::group(nonempty(g.display_name)?, nonempty(g.mail)?))),
            ),
            Err(e) => warn!(error = %e, "graph: group search failed, returning users only"),
        }

        debug!(%query, found = found.len(), "graph: directory search");
        Ok(directory::cap(found))
    }

    async fn directory_get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<GraphList<T>, NotifyError> {
        let res = self
            .mail_client
            .get(format!("{}/{path}", self.graph_base))
            .bearer_auth(token)
            .header("ConsistencyLevel", "eventual")
            .query(query)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !res.status().is_success() {
            return Err(NotifyError::Status(res.status().as_u16()));
        }
        res.json().await.map_err(|e| NotifyError::Transport(format!("{path} parse: {e}")))
    }

    async fn access_token(&self) -> Result<String, NotifyError> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref()
            && t.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN
        {
            return Ok(t.access_token.clone());
        }

        let creds = &self.credentials;
        let tenant = creds.tenant_id.as_deref().ok_or(NotifyError::MissingCredentials("GRAPH_TENANT_ID"))?;
        let client_id = creds.client_id.as_deref().ok_or(NotifyError::MissingCredentials("GRAPH_CLIENT_ID"))?;
        let secret = creds
            .client_secret
            .as_deref()
            .ok_or(NotifyError::MissingCredentials("GRAPH_CLIENT_SECRET"))?;

        let url = format!("{}/{tenant}/oauth2/v2.0/token", self.login_base);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", secret),
            ("scope", GRAPH_SCOPE),
        ];
        let res = self
            .mail_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(format!("token request: {e}")))?;
        if !res.status().is_success() {
            warn!(status = %res.status(), "graph: token request rejected (check tenant/client/secret)");
            return Err(NotifyError::Status(res.status().as_u16()));
        }
        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| NotifyError::Transport(format!("token parse: {e}")))?;

        let ttl = Duration::from_secs(body.expires_in.unwrap_or(3600));
        info!(expires_in = ttl.as_secs(), "graph: access token acquired");
        *cached = Some(CachedToken { access_token: body.access_token.clone(), expires_at: Instant::now() + ttl });
        Ok(body.access_token)
    }
}
