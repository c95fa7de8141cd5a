pub mod builder;
pub mod processor;
pub mod reply;
pub mod session;
pub mod steps;

pub use builder::SessionBuilder;
pub use processor::{ProcessorError, ProcessorPhase, RunEventProcessor, RunEvents};
pub use reply::{wait_for_reply, AgentReply, ChatError};
pub use session::{AgentSession, ApprovalDecision, McpServer, DEFAULT_MCP_SERVER_LABEL};
pub use steps::parse_arguments;

// Re-export key types from foundry-types
pub use foundry_types::{PollConfig, RunEvent, RunOptions};
