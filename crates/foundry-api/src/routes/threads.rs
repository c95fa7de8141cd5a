use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use foundry_agents::{ListOrder, ThreadMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message_id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl From<ThreadMessage> for MessageResponse {
    fn from(message: ThreadMessage) -> Self {
        Self {
            content: message.text_value().unwrap_or_default().to_string(),
            message_id: message.id,
            role: message.role,
            run_id: message.run_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// Create a new conversation thread
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let thread_id = state.session.create_thread().await?;
    tracing::info!("Created thread {}", thread_id);

    Ok((StatusCode::CREATED, Json(ThreadResponse { thread_id })))
}

/// Messages of a thread, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let messages = state
        .session
        .client()
        .list_messages(&thread_id, ListOrder::Asc)
        .await?;

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}
