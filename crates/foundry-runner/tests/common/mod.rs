//! Scripted in-memory agents client for driving the processor through run snapshots

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use foundry_agents::{
    AgentThread, AgentsClient, CreateRunRequest, ListOrder, RunStep, ThreadMessage, ThreadRun,
    ToolApproval,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the remote side reports for one `get_run` read and the steps listed after it
#[derive(Clone)]
pub struct Snapshot {
    pub run: Result<ThreadRun, String>,
    pub steps: Result<Vec<RunStep>, String>,
}

impl Snapshot {
    pub fn new(run: ThreadRun, steps: Vec<RunStep>) -> Self {
        Self {
            run: Ok(run),
            steps: Ok(steps),
        }
    }

    pub fn run_error(message: &str) -> Self {
        Self {
            run: Err(message.to_string()),
            steps: Ok(vec![]),
        }
    }

    pub fn steps_error(run: ThreadRun, message: &str) -> Self {
        Self {
            run: Ok(run),
            steps: Err(message.to_string()),
        }
    }
}

#[derive(Default)]
struct State {
    snapshots: Vec<Snapshot>,
    reads: usize,
    current: usize,
    messages: HashMap<String, ThreadMessage>,
    failing_messages: HashMap<String, usize>,
    message_fetches: usize,
    approvals: Vec<(String, String, Vec<ToolApproval>)>,
    created_runs: Vec<(String, CreateRunRequest)>,
    posted_messages: Vec<(String, String)>,
    listed_messages: Vec<ThreadMessage>,
}

/// Each `get_run` advances to the next snapshot; the last one repeats forever
#[derive(Default)]
pub struct ScriptedClient {
    state: Mutex<State>,
}

impl ScriptedClient {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        let client = Self::default();
        client.state.lock().unwrap().snapshots = snapshots;
        client
    }

    pub fn with_message(self, message_id: &str, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(message_id.to_string(), message(message_id, text));
        self
    }

    pub fn with_raw_message(self, message: ThreadMessage) -> Self {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(message.id.clone(), message);
        self
    }

    /// Make the first `times` fetches of a message fail
    pub fn failing_message(self, message_id: &str, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_messages
            .insert(message_id.to_string(), times);
        self
    }

    pub fn with_thread_messages(self, messages: Vec<ThreadMessage>) -> Self {
        self.state.lock().unwrap().listed_messages = messages;
        self
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn message_fetches(&self) -> usize {
        self.state.lock().unwrap().message_fetches
    }

    pub fn approvals(&self) -> Vec<(String, String, Vec<ToolApproval>)> {
        self.state.lock().unwrap().approvals.clone()
    }

    pub fn created_runs(&self) -> Vec<(String, CreateRunRequest)> {
        self.state.lock().unwrap().created_runs.clone()
    }

    pub fn posted_messages(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().posted_messages.clone()
    }
}

#[async_trait]
impl AgentsClient for ScriptedClient {
    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<ThreadRun> {
        let mut state = self.state.lock().unwrap();
        if state.snapshots.is_empty() {
            return Err(anyhow!("no snapshots scripted"));
        }
        let index = state.reads.min(state.snapshots.len() - 1);
        state.reads += 1;
        state.current = index;
        state.snapshots[index].run.clone().map_err(|e| anyhow!(e))
    }

    async fn list_steps(&self, _thread_id: &str, _run_id: &str, order: ListOrder) -> Result<Vec<RunStep>> {
        assert_eq!(order, ListOrder::Asc, "steps must be listed in creation order");
        let state = self.state.lock().unwrap();
        state.snapshots[state.current].steps.clone().map_err(|e| anyhow!(e))
    }

    async fn get_message(&self, _thread_id: &str, message_id: &str) -> Result<ThreadMessage> {
        let mut state = self.state.lock().unwrap();
        state.message_fetches += 1;
        if let Some(remaining) = state.failing_messages.get_mut(message_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(anyhow!("message {} temporarily unavailable", message_id));
            }
        }
        state
            .messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| anyhow!("No message found with id {}", message_id))
    }

    async fn list_messages(&self, _thread_id: &str, _order: ListOrder) -> Result<Vec<ThreadMessage>> {
        Ok(self.state.lock().unwrap().listed_messages.clone())
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        Ok(AgentThread {
            id: "thread_new".to_string(),
            created_at: None,
        })
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let mut state = self.state.lock().unwrap();
        state
            .posted_messages
            .push((thread_id.to_string(), content.to_string()));
        Ok(serde_json::from_value(json!({
            "id": "msg_user",
            "thread_id": thread_id,
            "role": "user",
            "content": [{"type": "text", "text": {"value": content}}]
        }))?)
    }

    async fn create_run(&self, thread_id: &str, request: CreateRunRequest) -> Result<ThreadRun> {
        self.state
            .lock()
            .unwrap()
            .created_runs
            .push((thread_id.to_string(), request));
        Ok(run("run_new", "queued"))
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: Vec<ToolApproval>,
    ) -> Result<ThreadRun> {
        self.state
            .lock()
            .unwrap()
            .approvals
            .push((thread_id.to_string(), run_id.to_string(), approvals));
        Ok(run(run_id, "in_progress"))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub const THREAD: &str = "thread_1";
pub const RUN: &str = "run_1";

pub fn run(run_id: &str, status: &str) -> ThreadRun {
    serde_json::from_value(json!({"id": run_id, "thread_id": THREAD, "status": status})).unwrap()
}

pub fn approval_run(run_id: &str, tool_call_ids: &[&str]) -> ThreadRun {
    let tool_calls: Vec<Value> = tool_call_ids
        .iter()
        .map(|id| {
            json!({"id": id, "type": "mcp", "name": "search", "server_label": "docs",
                   "arguments": "{\"query\": \"rust\"}"})
        })
        .collect();

    serde_json::from_value(json!({
        "id": run_id,
        "thread_id": THREAD,
        "status": "requires_action",
        "required_action": {
            "type": "submit_tool_approval",
            "submit_tool_approval": {"tool_calls": tool_calls}
        }
    }))
    .unwrap()
}

pub fn failed_run(run_id: &str, code: &str, message: &str) -> ThreadRun {
    serde_json::from_value(json!({
        "id": run_id,
        "thread_id": THREAD,
        "status": "failed",
        "last_error": {"code": code, "message": message}
    }))
    .unwrap()
}

pub fn message_step(step_id: &str, message_id: &str, status: &str) -> RunStep {
    serde_json::from_value(json!({
        "id": step_id,
        "type": "message_creation",
        "status": status,
        "step_details": {"type": "message_creation", "message_creation": {"message_id": message_id}}
    }))
    .unwrap()
}

/// A tool-calls step; `None` output means the call has not produced output yet
pub fn tool_step(step_id: &str, calls: &[(&str, Option<&str>)], status: &str) -> RunStep {
    let tool_calls: Vec<Value> = calls
        .iter()
        .map(|(id, output)| {
            json!({"id": id, "type": "mcp", "name": "search", "server_label": "docs",
                   "arguments": "{\"query\": \"rust\"}", "output": output})
        })
        .collect();

    serde_json::from_value(json!({
        "id": step_id,
        "type": "tool_calls",
        "status": status,
        "step_details": {"type": "tool_calls", "tool_calls": tool_calls}
    }))
    .unwrap()
}

pub fn message(message_id: &str, text: &str) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": message_id,
        "thread_id": THREAD,
        "role": "assistant",
        "run_id": RUN,
        "content": [{"type": "text", "text": {"value": text, "annotations": []}}]
    }))
    .unwrap()
}
