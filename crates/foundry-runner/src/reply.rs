//! Simplified chat loop: wait for a run to end and read the assistant's answer

use foundry_agents::{AgentsClient, Annotation, ListOrder, RunStatus};
use foundry_types::PollConfig;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Run failed: {message}")]
    RunFailed {
        message: String,
        code: Option<String>,
    },

    #[error("Run ended with status {status}")]
    RunEnded { status: RunStatus },

    #[error("Run did not finish after {attempts} polls")]
    Timeout { attempts: usize },

    #[error("Run {run_id} completed without an assistant reply")]
    NoReply { run_id: String },

    #[error(transparent)]
    Client(#[from] anyhow::Error),
}

/// Final assistant answer of a run, with the labels of its citations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    pub message_id: String,
    pub content: String,
    pub citations: Vec<String>,
}

/// Poll `get_run` until the run ends, at most `config.max_attempts` times
pub async fn wait_for_reply(
    client: &dyn AgentsClient,
    thread_id: &str,
    run_id: &str,
    config: &PollConfig,
) -> Result<AgentReply, ChatError> {
    for attempt in 1..=config.max_attempts {
        let run = client.get_run(thread_id, run_id).await?;
        tracing::debug!("Run {} status: {} (poll {})", run_id, run.status, attempt);

        match run.status {
            RunStatus::Completed => return latest_reply(client, thread_id, run_id).await,
            RunStatus::Failed => {
                let last_error = run.last_error.unwrap_or_default();
                return Err(ChatError::RunFailed {
                    message: last_error.message.unwrap_or_else(|| "Run failed".to_string()),
                    code: last_error.code,
                });
            }
            status if status.is_terminal() => return Err(ChatError::RunEnded { status }),
            _ => {}
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.poll_interval).await;
        }
    }

    tracing::warn!("Gave up waiting for run {} after {} polls", run_id, config.max_attempts);
    Err(ChatError::Timeout {
        attempts: config.max_attempts,
    })
}

async fn latest_reply(
    client: &dyn AgentsClient,
    thread_id: &str,
    run_id: &str,
) -> Result<AgentReply, ChatError> {
    let messages = client.list_messages(thread_id, ListOrder::Desc).await?;

    let message = messages
        .iter()
        .filter(|m| m.is_assistant())
        .filter(|m| m.run_id.as_deref().map_or(true, |id| id == run_id))
        .find(|m| m.text_value().is_some())
        .ok_or_else(|| ChatError::NoReply {
            run_id: run_id.to_string(),
        })?;

    Ok(AgentReply {
        message_id: message.id.clone(),
        content: message.text_value().unwrap_or_default().to_string(),
        citations: message
            .annotations()
            .filter_map(Annotation::label)
            .map(str::to_string)
            .collect(),
    })
}
