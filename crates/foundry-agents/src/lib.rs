pub mod auth;
pub mod azure;
pub mod config;
pub mod traits;
pub mod types;

pub use auth::{ClientSecretCredential, StaticTokenCredential, TokenCredential};
pub use azure::{AzureAgentsClient, AzureAgentsClientBuilder};
pub use config::{ClientFactory, CredentialConfig, FoundryConfig};
pub use traits::{AgentsClient, CreateRunRequest, ListOrder, ToolApproval};
pub use types::{
    AgentThread, Annotation, LastError, MessageContent, Page, RequiredAction, RequiredToolCall,
    RunStatus, RunStep, StepDetails, StepStatus, StepToolCall, StepType, ThreadMessage, ThreadRun,
};
