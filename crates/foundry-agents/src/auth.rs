// Bearer token acquisition for the agents service and for MCP tool servers

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;

pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Scope accepted by the Foundry agents data plane
pub const AGENTS_SCOPE: &str = "https://ai.azure.com/.default";

/// Scope used for MCP tool server tokens
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Longest `expires_in` honoured from a token endpoint
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A fixed token, for development and tests
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 client-credentials flow against Entra ID, with an in-memory cache
pub struct ClientSecretCredential {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl AsRef<str>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            token_url: token_url(AUTHORITY_HOST, tenant_id.as_ref()),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: AGENTS_SCOPE.to_string(),
            cache: Mutex::new(None),
        })
    }

    /// Build from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        let tenant_id = std::env::var("AZURE_TENANT_ID").context("AZURE_TENANT_ID is not set")?;
        let client_id = std::env::var("AZURE_CLIENT_ID").context("AZURE_CLIENT_ID is not set")?;
        let client_secret =
            std::env::var("AZURE_CLIENT_SECRET").context("AZURE_CLIENT_SECRET is not set")?;
        Self::new(tenant_id, client_id, client_secret)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Override the authority host, e.g. for sovereign clouds or a local mock
    pub fn with_authority_host(mut self, host: impl AsRef<str>, tenant_id: impl AsRef<str>) -> Self {
        self.token_url = token_url(host.as_ref(), tenant_id.as_ref());
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .context("Failed to send token request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Token endpoint error ({}): {}", status, error_text);
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        let lifetime = body.expires_in.as_ref().and_then(parse_seconds).unwrap_or(3600);
        tracing::debug!(scope = %self.scope, lifetime_secs = lifetime, "Obtained access token");

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: expires_at(Utc::now(), lifetime),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Number on v2 endpoints, string on v1
    #[serde(default)]
    expires_in: Option<Value>,
}

fn parse_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn expires_at(now: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    now + ChronoDuration::seconds(lifetime_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS))
}

fn token_url(host: &str, tenant_id: &str) -> String {
    format!("{}/{}/oauth2/v2.0/token", host.trim_end_matches('/'), tenant_id)
}
