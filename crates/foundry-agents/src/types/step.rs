use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_to_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    ToolCalls,
    MessageCreation,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

/// One unit of remote progress within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub status: StepStatus,
    #[serde(default)]
    pub step_details: StepDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl RunStep {
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetails {
    ToolCalls {
        #[serde(default)]
        tool_calls: Vec<StepToolCall>,
    },
    MessageCreation {
        #[serde(default)]
        message_creation: Option<MessageCreation>,
    },
    #[default]
    #[serde(other)]
    Unknown,
}

impl StepDetails {
    pub fn tool_calls(&self) -> Option<&[StepToolCall]> {
        match self {
            StepDetails::ToolCalls { tool_calls } => Some(tool_calls),
            _ => None,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            StepDetails::MessageCreation {
                message_creation: Some(creation),
            } => creation.message_id.as_deref().filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// A tool call as recorded on a completed (or completing) step
///
/// MCP calls carry `name`/`arguments`/`output` inline; function calls nest
/// them under `function`. The accessors hide the difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub tool_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_label: Option<String>,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl StepToolCall {
    pub fn tool_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.function.as_ref().map(|f| f.name.as_str()))
    }

    pub fn raw_arguments(&self) -> &Value {
        match (&self.arguments, &self.function) {
            (Value::Null, Some(function)) => &function.arguments,
            (args, _) => args,
        }
    }

    /// Output as raw text; `None` when absent or JSON null
    pub fn output_text(&self) -> Option<String> {
        self.output
            .as_ref()
            .or_else(|| self.function.as_ref().and_then(|f| f.output.as_ref()))
            .filter(|v| !v.is_null())
            .map(value_to_text)
    }
}
