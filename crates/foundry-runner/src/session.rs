use crate::builder::SessionBuilder;
use crate::processor::RunEventProcessor;
use crate::reply::{wait_for_reply, AgentReply, ChatError};
use anyhow::{Context, Result};
use foundry_agents::{AgentsClient, CreateRunRequest, TokenCredential, ToolApproval};
use foundry_types::{PollConfig, RequiresApprovalEvent, RunOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_MCP_SERVER_LABEL: &str = "mcp_server";

/// Human verdict on a pending approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

impl ApprovalDecision {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            ApprovalDecision::Approve
        } else {
            ApprovalDecision::Deny
        }
    }

    pub fn is_approved(&self) -> bool {
        *self == ApprovalDecision::Approve
    }
}

/// An MCP tool server the agent calls through, authenticated with a bearer token
pub struct McpServer {
    server_label: String,
    credential: Arc<dyn TokenCredential>,
}

impl McpServer {
    pub fn new(server_label: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            server_label: server_label.into(),
            credential,
        }
    }

    pub fn server_label(&self) -> &str {
        &self.server_label
    }

    /// Headers the remote side forwards to the MCP server
    pub async fn headers(&self) -> Result<HashMap<String, String>> {
        let token = self
            .credential
            .token()
            .await
            .context("Failed to acquire MCP access token")?;

        Ok(HashMap::from([(
            "authorization".to_string(),
            format!("bearer {}", token),
        )]))
    }

    /// Run-level `tool_resources` for this server
    pub fn tool_resources(&self, headers: &HashMap<String, String>, options: &RunOptions) -> Value {
        json!({
            "mcp": [{
                "server_label": self.server_label,
                "headers": headers,
                "require_approval": options.approval_mode(),
            }]
        })
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("server_label", &self.server_label)
            .finish_non_exhaustive()
    }
}

/// Agent/session manager: creates threads and runs, and submits approval decisions
///
/// Observing a run is left to [`RunEventProcessor`]; the session is the only
/// component that writes to a run.
pub struct AgentSession {
    client: Arc<dyn AgentsClient>,
    agent_id: String,
    thread_id: Option<String>,
    options: RunOptions,
    poll_config: PollConfig,
    mcp: Option<McpServer>,
}

impl AgentSession {
    pub(crate) fn new(
        client: Arc<dyn AgentsClient>,
        agent_id: String,
        thread_id: Option<String>,
        options: RunOptions,
        poll_config: PollConfig,
        mcp: Option<McpServer>,
    ) -> Self {
        Self {
            client,
            agent_id,
            thread_id,
            options,
            poll_config,
            mcp,
        }
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn client(&self) -> &Arc<dyn AgentsClient> {
        &self.client
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.options
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll_config
    }

    pub async fn create_thread(&self) -> Result<String> {
        let thread = self.client.create_thread().await?;
        tracing::info!("Created thread: {}", thread.id);
        Ok(thread.id)
    }

    /// The session's thread, created on first use
    pub async fn ensure_thread(&mut self) -> Result<String> {
        if let Some(thread_id) = &self.thread_id {
            return Ok(thread_id.clone());
        }

        let thread_id = self.create_thread().await?;
        self.thread_id = Some(thread_id.clone());
        Ok(thread_id)
    }

    /// Post a user message and start a run on it, returning the run id
    pub async fn create_run(&self, thread_id: &str, message: &str) -> Result<String> {
        self.client
            .create_message(thread_id, message)
            .await
            .context("Failed to post user message")?;

        let mut request =
            CreateRunRequest::new(self.agent_id.clone()).with_instructions(self.options.instructions.clone());

        if let Some(mcp) = &self.mcp {
            match mcp.headers().await {
                Ok(headers) => {
                    request = request.with_tool_resources(mcp.tool_resources(&headers, &self.options));
                    tracing::info!(
                        "Run uses MCP server {} (require_approval={})",
                        mcp.server_label(),
                        self.options.approval_mode()
                    );
                }
                Err(e) => tracing::error!("Failed to initialize MCP tool: {:#}", e),
            }
        }

        let run = self
            .client
            .create_run(thread_id, request)
            .await
            .context("Failed to create run")?;
        tracing::info!("Created run: {}", run.id);
        Ok(run.id)
    }

    /// Send a message on the session's own thread
    pub async fn send_message(&mut self, message: &str) -> Result<(String, String)> {
        let thread_id = self.ensure_thread().await?;
        let run_id = self.create_run(&thread_id, message).await?;
        Ok((thread_id, run_id))
    }

    /// A fresh processor for one run
    pub fn processor(&self) -> RunEventProcessor {
        RunEventProcessor::new(Arc::clone(&self.client))
    }

    /// Submit one decision per pending tool call of `event`
    ///
    /// Returns `Ok(false)` when the request had no tool calls to decide on.
    pub async fn submit_approvals(
        &self,
        event: &RequiresApprovalEvent,
        decision: ApprovalDecision,
    ) -> Result<bool> {
        if event.tool_calls.is_empty() {
            tracing::warn!("Approval request for run {} has no tool calls", event.run_id);
            return Ok(false);
        }

        let headers = match &self.mcp {
            Some(mcp) => mcp.headers().await?,
            None => HashMap::new(),
        };

        let approvals: Vec<ToolApproval> = event
            .tool_call_ids()
            .into_iter()
            .map(|id| ToolApproval::new(id, decision.is_approved()).with_headers(headers.clone()))
            .collect();

        tracing::info!(
            "Submitting {} tool approval(s) for run {} (approved={})",
            approvals.len(),
            event.run_id,
            decision.is_approved()
        );
        self.client
            .submit_tool_approvals(&event.thread_id, &event.run_id, approvals)
            .await
            .context("Failed to submit tool approvals")?;

        Ok(true)
    }

    /// Block until the run ends and return the assistant's latest reply
    pub async fn wait_for_reply(&self, thread_id: &str, run_id: &str) -> Result<AgentReply, ChatError> {
        wait_for_reply(self.client.as_ref(), thread_id, run_id, &self.poll_config).await
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("agent_id", &self.agent_id)
            .field("thread_id", &self.thread_id)
            .field("mcp", &self.mcp)
            .finish_non_exhaustive()
    }
}
