pub mod config;
pub mod events;

pub use config::{
    PollConfig, RunOptions, DEFAULT_INSTRUCTIONS, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
pub use events::{
    ErrorEvent, EventType, MessageEvent, PendingToolCall, RequiresApprovalEvent, RunCompletedEvent,
    RunEvent, ToolCallEvent, ToolCallStatus, ToolCallsStepEvent, RAW_ARGUMENTS_KEY,
};
