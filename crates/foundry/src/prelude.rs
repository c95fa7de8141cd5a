//! Prelude module for convenient imports
//!
//! ```rust
//! use foundry::prelude::*;
//! ```

pub use crate::{
    AgentSession, AgentsClient, ApprovalDecision, ClientFactory, CredentialConfig, EventType,
    FoundryConfig, PollConfig, RequiresApprovalEvent, RunEvent, RunEventProcessor, RunOptions,
    SessionBuilder,
};
