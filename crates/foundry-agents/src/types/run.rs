use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Server-side status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }

    /// Queued or in progress: steps may still be appearing
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    /// Anything that is neither active nor waiting on the caller
    pub fn is_terminal(&self) -> bool {
        !self.is_active() && *self != RunStatus::RequiresAction
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRun {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
}

impl ThreadRun {
    /// Pending tool calls when the run is waiting on a human approval
    pub fn pending_approvals(&self) -> Option<&[RequiredToolCall]> {
        match (&self.status, &self.required_action) {
            (RunStatus::RequiresAction, Some(RequiredAction::SubmitToolApproval { submit_tool_approval })) => {
                Some(&submit_tool_approval.tool_calls)
            }
            _ => None,
        }
    }
}

/// What the run needs from the caller before it can continue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    SubmitToolApproval {
        submit_tool_approval: SubmitToolApproval,
    },
    SubmitToolOutputs {
        #[serde(default)]
        submit_tool_outputs: Value,
    },
    #[serde(other)]
    Unknown,
}

impl RequiredAction {
    pub fn kind(&self) -> &'static str {
        match self {
            RequiredAction::SubmitToolApproval { .. } => "submit_tool_approval",
            RequiredAction::SubmitToolOutputs { .. } => "submit_tool_outputs",
            RequiredAction::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolApproval {
    #[serde(default)]
    pub tool_calls: Vec<RequiredToolCall>,
}

/// A tool call the remote run wants approved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub tool_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_label: Option<String>,
    /// JSON-encoded string or an already structured object
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
