// Azure AI Foundry agents client implementation

use crate::auth::TokenCredential;
use crate::traits::{AgentsClient, CreateRunRequest, ListOrder, ToolApproval};
use crate::types::{AgentThread, Page, RunStep, ThreadMessage, ThreadRun};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "v1";

/// Azure AI Foundry agents client (HTTP direct, no SDK)
///
/// - URL: {project endpoint}/threads/{thread}/runs/{run}?api-version=...
/// - Auth header: `Authorization: Bearer` from a [`TokenCredential`]
pub struct AzureAgentsClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for AzureAgentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAgentsClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureAgentsClient {
    pub fn builder() -> AzureAgentsClientBuilder {
        AzureAgentsClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the full URL for a project-relative path
    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .credential
            .token()
            .await
            .context("Failed to acquire access token")?;
        Ok(request
            .bearer_auth(token)
            .query(&[("api-version", self.api_version.as_str())]))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.authorized(self.http_client.get(self.build_url(path))).await?;
        let response = request
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;
        Self::parse(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let request = self.authorized(self.http_client.post(self.build_url(path))).await?;
        let response = request
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Foundry agents API error ({}): {}", status, error_text);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Follow `has_more`/`last_id` until the collection is exhausted
    async fn list_all<T: DeserializeOwned>(&self, path: &str, order: ListOrder) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("order", order.as_str())];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: Page<T> = self.get_json(path, &query).await?;
            let count = page.data.len();
            items.extend(page.data);

            match page.last_id {
                Some(last_id) if page.has_more && count > 0 => after = Some(last_id),
                _ => break,
            }
        }

        Ok(items)
    }
}

/// Builder for AzureAgentsClient
#[derive(Default)]
pub struct AzureAgentsClientBuilder {
    endpoint: Option<String>,
    api_version: Option<String>,
    credential: Option<Arc<dyn TokenCredential>>,
    timeout: Option<Duration>,
}

impl AzureAgentsClientBuilder {
    /// Set the project endpoint
    /// Example: "https://my-resource.services.ai.azure.com/api/projects/my-project"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AzureAgentsClient> {
        let endpoint = self.endpoint.context("Endpoint is required")?;
        let credential = self.credential.context("Credential is required")?;
        let api_version = self
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        // Remove trailing slash from endpoint
        let endpoint = endpoint.trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            anyhow::bail!("Endpoint must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(AzureAgentsClient {
            http_client,
            endpoint,
            api_version,
            credential,
        })
    }
}

// ============================================================================
// TRAIT IMPLEMENTATION
// ============================================================================

#[async_trait]
impl AgentsClient for AzureAgentsClient {
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun> {
        self.get_json(&format!("threads/{}/runs/{}", thread_id, run_id), &[])
            .await
    }

    async fn list_steps(&self, thread_id: &str, run_id: &str, order: ListOrder) -> Result<Vec<RunStep>> {
        self.list_all(&format!("threads/{}/runs/{}/steps", thread_id, run_id), order)
            .await
    }

    async fn get_message(&self, thread_id: &str, message_id: &str) -> Result<ThreadMessage> {
        self.get_json(&format!("threads/{}/messages/{}", thread_id, message_id), &[])
            .await
    }

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>> {
        self.list_all(&format!("threads/{}/messages", thread_id), order)
            .await
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        self.post_json("threads", &serde_json::json!({}))
            .await
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let body = serde_json::json!({
            "role": "user",
            "content": content,
        });
        self.post_json(&format!("threads/{}/messages", thread_id), &body)
            .await
    }

    async fn create_run(&self, thread_id: &str, request: CreateRunRequest) -> Result<ThreadRun> {
        let body = serde_json::to_value(&request)?;
        self.post_json(&format!("threads/{}/runs", thread_id), &body)
            .await
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: Vec<ToolApproval>,
    ) -> Result<ThreadRun> {
        let body = serde_json::json!({
            "tool_approvals": approvals,
        });
        self.post_json(
            &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            &body,
        )
        .await
    }
}
