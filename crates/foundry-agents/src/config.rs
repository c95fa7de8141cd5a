// Configuration layer for building an agents client from settings

use crate::auth::{ClientSecretCredential, StaticTokenCredential, TokenCredential};
use crate::azure::{AzureAgentsClient, DEFAULT_API_VERSION};
use crate::traits::AgentsClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the client authenticates against the agents service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialConfig {
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },
    StaticToken {
        token: String,
    },
}

impl CredentialConfig {
    pub fn client_secret(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::ClientSecret {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: None,
        }
    }

    pub fn static_token(token: impl Into<String>) -> Self {
        Self::StaticToken { token: token.into() }
    }

    pub fn into_credential(self) -> Result<Arc<dyn TokenCredential>> {
        match self {
            CredentialConfig::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                scope,
            } => {
                let mut credential = ClientSecretCredential::new(tenant_id, client_id, client_secret)?;
                if let Some(scope) = scope {
                    credential = credential.with_scope(scope);
                }
                Ok(Arc::new(credential))
            }
            CredentialConfig::StaticToken { token } => Ok(Arc::new(StaticTokenCredential::new(token))),
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundryConfig {
    /// Project endpoint, e.g. "https://my-resource.services.ai.azure.com/api/projects/my-project"
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    pub credential: CredentialConfig,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl FoundryConfig {
    pub fn new(endpoint: impl Into<String>, credential: CredentialConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: default_api_version(),
            credential,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

/// Factory for creating agents clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: FoundryConfig) -> Result<Arc<dyn AgentsClient>> {
        let credential = config.credential.into_credential()?;
        let client = AzureAgentsClient::builder()
            .endpoint(config.endpoint)
            .api_version(config.api_version)
            .credential(credential)
            .build()?;
        Ok(Arc::new(client))
    }
}
