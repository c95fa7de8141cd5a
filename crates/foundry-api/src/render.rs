//! Plain-text transcript rendering for terminal clients

use foundry_types::{RunEvent, ToolCallEvent, ToolCallStatus};
use serde_json::{Map, Value};
use std::fmt::Write;

/// Marker some MCP servers put in front of their JSON payload
pub const TOOL_RESULT_MARKER: &str = "TOOL RESULT:";

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

/// Interpret raw tool output: the part after `TOOL RESULT:` (or the whole
/// output) parsed as JSON, else the original text untouched
pub fn parse_tool_output(output: &str) -> ToolOutput {
    let candidate = match output.split_once(TOOL_RESULT_MARKER) {
        Some((_, rest)) => rest,
        None => output,
    };

    match serde_json::from_str(candidate.trim()) {
        Ok(value) => ToolOutput::Json(value),
        Err(_) => ToolOutput::Text(output.to_string()),
    }
}

/// Only messages and tool calls belong to the conversation history
pub fn is_history_entry(event: &RunEvent) -> bool {
    matches!(
        event,
        RunEvent::Message(_) | RunEvent::ToolCall(_) | RunEvent::ToolCallsStep(_)
    )
}

pub fn render_event(event: &RunEvent) -> String {
    match event {
        RunEvent::Message(message) => format!("assistant> {}", message.content),
        RunEvent::ToolCall(call) => render_tool_call(call),
        RunEvent::ToolCallsStep(step) => step
            .tool_calls
            .iter()
            .map(render_tool_call)
            .collect::<Vec<_>>()
            .join("\n"),
        RunEvent::RequiresApproval(approval) => {
            let mut out = String::from("Tool call(s) require approval:");
            for call in &approval.tool_calls {
                let _ = write!(out, "\n  - {}", tool_label(&call.name, call.server_label.as_deref()));
                let _ = write!(out, "\n    id: {} type: {}", call.id, call.tool_type);
                if !call.arguments.is_empty() {
                    let _ = write!(out, "\n    arguments: {}", render_arguments(&call.arguments));
                }
            }
            out
        }
        RunEvent::RunCompleted(done) => format!("[run {} completed]", done.run_id),
        RunEvent::Error(error) => match &error.error_code {
            Some(code) => format!("error> {} (code: {})", error.error_message, code),
            None => format!("error> {}", error.error_message),
        },
    }
}

fn render_tool_call(call: &ToolCallEvent) -> String {
    let status = match call.status {
        ToolCallStatus::Completed => "done",
        ToolCallStatus::InProgress => "running",
        ToolCallStatus::Failed => "failed",
    };
    let mut out = format!(
        "tool> {} [{}]",
        tool_label(&call.tool_name, call.server_label.as_deref()),
        status
    );

    if !call.arguments.is_empty() {
        let _ = write!(out, "\n  arguments: {}", render_arguments(&call.arguments));
    }

    match call.output.as_deref() {
        None => out.push_str("\n  (no output yet)"),
        Some(output) => match parse_tool_output(output) {
            ToolOutput::Json(value) => render_structured(&mut out, &value),
            ToolOutput::Text(text) => {
                let _ = write!(out, "\n  output: {}", text);
            }
        },
    }
    out
}

fn render_structured(out: &mut String, value: &Value) {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => {
            out.push_str("\n  tool executed successfully");
            if let Some(count) = value.get("count") {
                let _ = write!(out, "\n  found {} results", count);
            }
        }
        Some(false) => {
            out.push_str("\n  tool execution failed");
            if let Some(error) = value.get("error") {
                let _ = write!(out, "\n  error: {}", display_value(error));
            }
        }
        None => {}
    }

    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    for line in pretty.lines() {
        let _ = write!(out, "\n  | {}", line);
    }
}

fn tool_label(name: &str, server_label: Option<&str>) -> String {
    match server_label {
        Some(server) => format!("{} ({})", name, server),
        None => name.to_string(),
    }
}

fn render_arguments(arguments: &Map<String, Value>) -> String {
    serde_json::to_string(arguments).unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Conversation history as shown to a terminal user
///
/// Approval requests and run lifecycle events are displayed but never stored.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<RunEvent>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render an event, keeping it if it is part of the history
    pub fn record(&mut self, event: &RunEvent) -> String {
        if is_history_entry(event) {
            self.entries.push(event.clone());
        }
        render_event(event)
    }

    pub fn entries(&self) -> &[RunEvent] {
        &self.entries
    }
}
