//! # Foundry
//!
//! Event-driven chat on top of Azure AI Foundry agent runs.
//!
//! A run on the remote service is only observable by polling. This crate turns
//! those polls into an ordered stream of [`RunEvent`]s that are each delivered
//! once, and pauses the stream when the agent asks a human to approve an MCP
//! tool call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foundry::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create_client(FoundryConfig::new(
//!         "https://my-resource.services.ai.azure.com/api/projects/my-project",
//!         CredentialConfig::static_token(std::env::var("FOUNDRY_ACCESS_TOKEN")?),
//!     ))?;
//!
//!     let mut session = AgentSession::builder()
//!         .client(client)
//!         .agent_id("asst_123")
//!         .build()?;
//!
//!     let (thread_id, run_id) = session.send_message("What's in my OneDrive?").await?;
//!     let mut processor = session.processor();
//!     let interval = session.poll_config().poll_interval;
//!
//!     loop {
//!         let mut events = processor.poll_run_events(&thread_id, &run_id, interval)?;
//!         while let Some(event) = events.next().await {
//!             println!("{:?}", event);
//!         }
//!
//!         let Some(approval) = processor.blocked_event().cloned() else { break };
//!         session.submit_approvals(&approval, ApprovalDecision::Approve).await?;
//!         processor.unblock();
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`foundry-types`**: run events, their identities, polling and run options
//! - **`foundry-agents`**: `AgentsClient` trait and the Azure REST implementation
//! - **`foundry-runner`**: `RunEventProcessor`, `AgentSession` and approval submission
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use foundry_types::{
    ErrorEvent, EventType, MessageEvent, PendingToolCall, PollConfig, RequiresApprovalEvent,
    RunCompletedEvent, RunEvent, RunOptions, ToolCallEvent, ToolCallStatus, ToolCallsStepEvent,
};

pub use foundry_agents::{
    AgentsClient, AzureAgentsClient, ClientFactory, ClientSecretCredential, CredentialConfig,
    FoundryConfig, ListOrder, RunStatus, StaticTokenCredential, TokenCredential, ToolApproval,
};

pub use foundry_runner::{
    wait_for_reply, AgentReply, AgentSession, ApprovalDecision, ChatError, ProcessorError,
    ProcessorPhase, RunEventProcessor, RunEvents, SessionBuilder,
};
