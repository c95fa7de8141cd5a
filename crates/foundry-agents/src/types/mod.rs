pub mod message;
pub mod run;
pub mod step;

pub use message::{AgentThread, Annotation, MessageContent, TextContent, ThreadMessage};
pub use run::{LastError, RequiredAction, RequiredToolCall, RunStatus, SubmitToolApproval, ThreadRun};
pub use step::{FunctionToolCall, MessageCreation, RunStep, StepDetails, StepStatus, StepToolCall, StepType};

use serde::{Deserialize, Serialize};

/// List envelope returned by every collection endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
}

/// Render a JSON value as the raw text the remote side sent
pub(crate) fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
