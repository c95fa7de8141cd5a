pub mod client;

pub use client::{AzureAgentsClient, AzureAgentsClientBuilder, DEFAULT_API_VERSION};
