use crate::types::{AgentThread, RunStep, ThreadMessage, ThreadRun};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Query and command surface of the remote agents service
///
/// The run event processor only reads (`get_run`, `list_steps`, `get_message`);
/// the session manager owns the writes.
#[async_trait]
pub trait AgentsClient: Send + Sync {
    /// Current snapshot of a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun>;

    /// Every step of a run in the requested creation order, across all pages
    async fn list_steps(&self, thread_id: &str, run_id: &str, order: ListOrder) -> Result<Vec<RunStep>>;

    async fn get_message(&self, thread_id: &str, message_id: &str) -> Result<ThreadMessage>;

    async fn list_messages(&self, thread_id: &str, order: ListOrder) -> Result<Vec<ThreadMessage>>;

    async fn create_thread(&self) -> Result<AgentThread>;

    /// Post a user message to a thread
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage>;

    async fn create_run(&self, thread_id: &str, request: CreateRunRequest) -> Result<ThreadRun>;

    /// Send human decisions for the tool calls a run is waiting on
    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: Vec<ToolApproval>,
    ) -> Result<ThreadRun>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Asc,
    Desc,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<Value>,
}

impl CreateRunRequest {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            assistant_id: agent_id.into(),
            instructions: None,
            tool_resources: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tool_resources(mut self, resources: Value) -> Self {
        self.tool_resources = Some(resources);
        self
    }
}

/// One approve/deny decision for a pending tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolApproval {
    pub tool_call_id: String,
    pub approve: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl ToolApproval {
    pub fn new(tool_call_id: impl Into<String>, approve: bool) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            approve,
            headers: HashMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}
