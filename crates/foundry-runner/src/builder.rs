use std::sync::Arc;
use anyhow::{Result, anyhow};

use foundry_agents::{AgentsClient, TokenCredential};
use foundry_types::{PollConfig, RunOptions};

use crate::session::{AgentSession, McpServer};

/// Builder for constructing an AgentSession with optional components
pub struct SessionBuilder {
    client: Option<Arc<dyn AgentsClient>>,
    agent_id: Option<String>,
    thread_id: Option<String>,
    options: RunOptions,
    poll_config: PollConfig,
    mcp: Option<McpServer>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            agent_id: None,
            thread_id: None,
            options: RunOptions::default(),
            poll_config: PollConfig::default(),
            mcp: None,
        }
    }

    /// Set the agents client
    pub fn client(mut self, client: Arc<dyn AgentsClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the agent (assistant) the runs are created for
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Reuse an existing thread instead of creating one
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn run_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    /// Attach an MCP tool server whose token is sent with runs and approvals
    pub fn with_mcp(mut self, server_label: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        self.mcp = Some(McpServer::new(server_label, credential));
        self
    }

    /// Build the AgentSession
    pub fn build(self) -> Result<AgentSession> {
        let client = self.client
            .ok_or_else(|| anyhow!("Agents client is required"))?;
        let agent_id = self.agent_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("Agent id is required"))?;

        Ok(AgentSession::new(
            client,
            agent_id,
            self.thread_id,
            self.options,
            self.poll_config,
            self.mcp,
        ))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
