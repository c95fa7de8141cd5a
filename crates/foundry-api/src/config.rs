use config::{Config as ConfigLoader, ConfigError, Environment, File};
use foundry_agents::auth::GRAPH_SCOPE;
use foundry_agents::{ClientSecretCredential, CredentialConfig, FoundryConfig, TokenCredential};
use foundry_types::{PollConfig, RunOptions, DEFAULT_INSTRUCTIONS};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub foundry: FoundrySettings,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub mcp: McpSettings,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Time a handler has to produce its response headers; SSE bodies are not bounded
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long a run blocked on approval waits before it is dropped
    #[serde(default = "default_parked_run_ttl_secs")]
    pub parked_run_ttl_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_parked_run_ttl_secs() -> u64 {
    900
}

impl ServerConfig {
    pub fn parked_run_ttl(&self) -> Duration {
        Duration::from_secs(self.parked_run_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoundrySettings {
    /// Project endpoint, e.g. "https://my-resource.services.ai.azure.com/api/projects/my-project"
    pub endpoint: String,
    pub agent_id: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "v1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    pub instructions: String,
    pub require_approval: bool,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            require_approval: true,
            poll_interval_ms: 1000,
            max_poll_attempts: 60,
        }
    }
}

impl RunSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl From<&RunSettings> for RunOptions {
    fn from(settings: &RunSettings) -> Self {
        RunOptions::new()
            .with_instructions(settings.instructions.clone())
            .with_require_approval(settings.require_approval)
    }
}

impl From<&RunSettings> for PollConfig {
    fn from(settings: &RunSettings) -> Self {
        PollConfig::new()
            .with_poll_interval(settings.poll_interval())
            .with_max_attempts(settings.max_poll_attempts)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpSettings {
    pub server_label: String,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            server_label: foundry_runner::DEFAULT_MCP_SERVER_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Credentials that never live in TOML
#[derive(Clone, Default)]
pub struct Secrets {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued bearer token; replaces the client-secret flow when set
    pub access_token: Option<String>,
    pub mcp_client_id: Option<String>,
    pub mcp_client_secret: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("mcp_client_id", &self.mcp_client_id)
            .field("mcp_client_secret", &self.mcp_client_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            tenant_id: var("AZURE_TENANT_ID"),
            client_id: var("AZURE_CLIENT_ID"),
            client_secret: var("AZURE_CLIENT_SECRET"),
            access_token: var("FOUNDRY_ACCESS_TOKEN"),
            mcp_client_id: var("MCP_CLIENT_ID"),
            mcp_client_secret: var("MCP_CLIENT_SECRET"),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed `APP_`, nested with `__`
    ///    (e.g. `APP_SERVER__PORT=8080`, `APP_FOUNDRY__AGENT_ID=asst_1`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.secrets = Secrets::from_env();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path, without ENV secrets
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.foundry.endpoint.is_empty() {
            return Err(ConfigError::Message("foundry.endpoint is required".to_string()));
        }
        if self.foundry.agent_id.is_empty() {
            return Err(ConfigError::Message("foundry.agent_id is required".to_string()));
        }
        if self.secrets.access_token.is_none() {
            for (name, value) in [
                ("AZURE_TENANT_ID", &self.secrets.tenant_id),
                ("AZURE_CLIENT_ID", &self.secrets.client_id),
                ("AZURE_CLIENT_SECRET", &self.secrets.client_secret),
            ] {
                if value.is_none() {
                    return Err(ConfigError::Message(format!(
                        "{} environment variable is required (or set FOUNDRY_ACCESS_TOKEN)",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Client configuration for the agents service
    pub fn foundry_config(&self) -> Result<FoundryConfig, ConfigError> {
        let credential = match &self.secrets.access_token {
            Some(token) => CredentialConfig::static_token(token.clone()),
            None => match (
                &self.secrets.tenant_id,
                &self.secrets.client_id,
                &self.secrets.client_secret,
            ) {
                (Some(tenant), Some(client), Some(secret)) => {
                    CredentialConfig::client_secret(tenant.clone(), client.clone(), secret.clone())
                }
                _ => {
                    return Err(ConfigError::Message(
                        "Azure credentials are not configured".to_string(),
                    ))
                }
            },
        };

        Ok(FoundryConfig::new(self.foundry.endpoint.clone(), credential)
            .with_api_version(self.foundry.api_version.clone()))
    }

    /// Token source for the MCP server, `None` when MCP is not configured
    pub fn mcp_credential(&self) -> anyhow::Result<Option<Arc<dyn TokenCredential>>> {
        let (Some(tenant), Some(client_id), Some(secret)) = (
            &self.secrets.tenant_id,
            &self.secrets.mcp_client_id,
            &self.secrets.mcp_client_secret,
        ) else {
            tracing::warn!("MCP configuration not found, MCP functionality will be disabled");
            return Ok(None);
        };

        let credential = ClientSecretCredential::new(tenant, client_id.clone(), secret.clone())?
            .with_scope(GRAPH_SCOPE);
        Ok(Some(Arc::new(credential)))
    }

    pub fn run_options(&self) -> RunOptions {
        (&self.run).into()
    }

    pub fn poll_config(&self) -> PollConfig {
        (&self.run).into()
    }
}
