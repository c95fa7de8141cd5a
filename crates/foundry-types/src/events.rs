use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key under which unparseable tool-call arguments are preserved verbatim
pub const RAW_ARGUMENTS_KEY: &str = "raw";

/// Discriminant of a [`RunEvent`], also used as the SSE event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    ToolCall,
    ToolCallsStep,
    RequiresApproval,
    Completed,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Message => "message",
            EventType::ToolCall => "tool_call",
            EventType::ToolCallsStep => "tool_calls_step",
            EventType::RequiresApproval => "requires_approval",
            EventType::Completed => "completed",
            EventType::Error => "error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    InProgress,
    Completed,
    Failed,
}

/// Everything that can happen during a run, as seen by a consumer
///
/// Identity is the content-derived `event_id`: two events with the same id are
/// the same logical event no matter how many times the remote run reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// One completed assistant message
    Message(MessageEvent),

    /// A single tool invocation reported on its own
    ToolCall(ToolCallEvent),

    /// A remote step whose tool calls all produced output
    ToolCallsStep(ToolCallsStepEvent),

    /// The run is paused until a human approves or denies its tool calls
    RequiresApproval(RequiresApprovalEvent),

    /// The run finished successfully
    #[serde(rename = "completed")]
    RunCompleted(RunCompletedEvent),

    /// The run failed, ended abnormally, or could not be polled
    Error(ErrorEvent),
}

impl RunEvent {
    pub fn event_id(&self) -> String {
        match self {
            RunEvent::Message(e) => e.event_id(),
            RunEvent::ToolCall(e) => e.event_id(),
            RunEvent::ToolCallsStep(e) => e.event_id(),
            RunEvent::RequiresApproval(e) => e.event_id(),
            RunEvent::RunCompleted(e) => e.event_id(),
            RunEvent::Error(e) => e.event_id(),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            RunEvent::Message(_) => EventType::Message,
            RunEvent::ToolCall(e) => e.event_type(),
            RunEvent::ToolCallsStep(_) => EventType::ToolCallsStep,
            RunEvent::RequiresApproval(_) => EventType::RequiresApproval,
            RunEvent::RunCompleted(_) => EventType::Completed,
            RunEvent::Error(_) => EventType::Error,
        }
    }

    /// Only approval requests block the stream
    pub fn is_blocking(&self) -> bool {
        matches!(self, RunEvent::RequiresApproval(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::RunCompleted(_) | RunEvent::Error(_))
    }
}

impl PartialEq for RunEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event_id() == other.event_id()
    }
}

impl Eq for RunEvent {}

impl Hash for RunEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.event_id().hash(state);
    }
}

/// Implements identity-by-`event_id` for a payload type
macro_rules! identity_by_event_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.event_id() == other.event_id()
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.event_id().hash(state);
                }
            }
        )*
    };
}

identity_by_event_id!(
    MessageEvent,
    ToolCallEvent,
    ToolCallsStepEvent,
    RequiresApprovalEvent,
    RunCompletedEvent,
    ErrorEvent,
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub content: String,
}

impl MessageEvent {
    pub fn new(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
        }
    }

    pub fn event_id(&self) -> String {
        format!("message_{}", self.message_id)
    }
}

/// A single tool invocation inside a tool-calls step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallEvent {
    pub tool_id: String,
    pub tool_name: String,
    pub tool_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_label: Option<String>,
    pub arguments: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub status: ToolCallStatus,
}

impl ToolCallEvent {
    pub fn event_id(&self) -> String {
        format!("tool_{}", self.tool_id)
    }

    pub fn event_type(&self) -> EventType {
        EventType::ToolCall
    }

    /// Output counts only when present and non-empty
    pub fn has_output(&self) -> bool {
        self.output.as_deref().is_some_and(|o| !o.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallsStepEvent {
    pub step_id: String,
    pub tool_calls: Vec<ToolCallEvent>,
    pub status: ToolCallStatus,
}

impl ToolCallsStepEvent {
    pub fn new(step_id: impl Into<String>, tool_calls: Vec<ToolCallEvent>, status: ToolCallStatus) -> Self {
        Self {
            step_id: step_id.into(),
            tool_calls,
            status,
        }
    }

    pub fn event_id(&self) -> String {
        format!("step_{}", self.step_id)
    }

    pub fn all_outputs_ready(&self) -> bool {
        self.tool_calls.iter().all(ToolCallEvent::has_output)
    }
}

/// A tool call waiting on a human decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub tool_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_label: Option<String>,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiresApprovalEvent {
    pub run_id: String,
    pub thread_id: String,
    pub tool_calls: Vec<PendingToolCall>,
}

impl RequiresApprovalEvent {
    pub fn new(
        run_id: impl Into<String>,
        thread_id: impl Into<String>,
        tool_calls: Vec<PendingToolCall>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            thread_id: thread_id.into(),
            tool_calls,
        }
    }

    /// Sorted tool ids make a re-observed request collapse onto the same id
    pub fn event_id(&self) -> String {
        let mut ids: Vec<&str> = self.tool_calls.iter().map(|tc| tc.id.as_str()).collect();
        ids.sort_unstable();
        format!("approval_{}_{}", self.run_id, ids.join("_"))
    }

    pub fn tool_call_ids(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|tc| tc.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    pub run_id: String,
}

impl RunCompletedEvent {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into() }
    }

    pub fn event_id(&self) -> String {
        format!("completed_{}", self.run_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ErrorEvent {
    pub fn new(error_message: impl Into<String>, error_code: Option<String>) -> Self {
        Self {
            error_message: error_message.into(),
            error_code,
        }
    }

    pub fn event_id(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.error_message.hash(&mut hasher);
        format!("error_{:016x}", hasher.finish())
    }
}

impl From<MessageEvent> for RunEvent {
    fn from(event: MessageEvent) -> Self {
        RunEvent::Message(event)
    }
}

impl From<ToolCallEvent> for RunEvent {
    fn from(event: ToolCallEvent) -> Self {
        RunEvent::ToolCall(event)
    }
}

impl From<ToolCallsStepEvent> for RunEvent {
    fn from(event: ToolCallsStepEvent) -> Self {
        RunEvent::ToolCallsStep(event)
    }
}

impl From<RequiresApprovalEvent> for RunEvent {
    fn from(event: RequiresApprovalEvent) -> Self {
        RunEvent::RequiresApproval(event)
    }
}

impl From<RunCompletedEvent> for RunEvent {
    fn from(event: RunCompletedEvent) -> Self {
        RunEvent::RunCompleted(event)
    }
}

impl From<ErrorEvent> for RunEvent {
    fn from(event: ErrorEvent) -> Self {
        RunEvent::Error(event)
    }
}
