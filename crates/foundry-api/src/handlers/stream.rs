use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use foundry_runner::{ApprovalDecision, RunEvent, RunEventProcessor};
use foundry_types::{ErrorEvent, EventType};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approve: bool,
}

/// Post a user message, start a run and stream its events using Server-Sent Events
///
/// The stream ends at the run's terminal event, or at an approval request. In
/// the latter case the processor is parked until the approval endpoint is hit.
pub async fn send_message_stream(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    let run_id = state.session.create_run(&thread_id, &req.content).await?;
    tracing::info!("Streaming run {} on thread {}", run_id, thread_id);

    let processor = state.session.processor();
    Ok(event_stream(state, thread_id, run_id, processor))
}

/// Submit the approval decision for a parked run and resume its event stream
pub async fn submit_approval_stream(
    State(state): State<Arc<AppState>>,
    Path((thread_id, run_id)): Path<(String, String)>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let parked = state
        .take(&run_id)
        .await
        .ok_or_else(|| ApiError::RunNotFound(run_id.clone()))?;

    if parked.thread_id != thread_id {
        let message = format!("Run {} does not belong to thread {}", run_id, thread_id);
        state.park(run_id, parked.thread_id, parked.processor).await;
        return Err(ApiError::BadRequest(message));
    }

    let mut processor = parked.processor;
    let event = processor
        .blocked_event()
        .cloned()
        .ok_or_else(|| ApiError::Conflict(format!("Run {} is not waiting for approval", run_id)))?;

    let decision = ApprovalDecision::from_approved(req.approve);
    if let Err(e) = state.session.submit_approvals(&event, decision).await {
        state.park(run_id, thread_id, processor).await;
        return Err(e.into());
    }
    tracing::info!(
        "Submitted {:?} for {} tool call(s) of run {}",
        decision,
        event.tool_calls.len(),
        run_id
    );

    processor.unblock();
    Ok(event_stream(state, thread_id, run_id, processor))
}

fn event_stream(
    state: Arc<AppState>,
    thread_id: String,
    run_id: String,
    mut processor: RunEventProcessor,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let poll_interval = state.session.poll_config().poll_interval;

    let stream = async_stream::stream! {
        {
            let mut events = match processor.poll_run_events(&thread_id, &run_id, poll_interval) {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("Cannot poll run {}: {}", run_id, e);
                    let event = RunEvent::Error(ErrorEvent::new(e.to_string(), Some("processor_state".to_string())));
                    yield Ok::<Event, Infallible>(to_sse_event(&event));
                    return;
                }
            };

            while let Some(event) = events.next().await {
                yield Ok::<Event, Infallible>(to_sse_event(&event));
            }
        }

        if processor.is_blocked() {
            state.park(run_id, thread_id, processor).await;
        } else {
            tracing::info!("Run {} finished with phase {:?}", run_id, processor.phase());
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// SSE frame named after the event type, carrying the serialized event
pub fn to_sse_event(event: &RunEvent) -> Event {
    let event_id = event.event_id();
    Event::default()
        .event(event.event_type().as_str())
        .id(event_id.clone())
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to serialize event {}: {}", event_id, e);
            Event::default()
                .event(EventType::Error.as_str())
                .data(format!("failed to serialize event {}", event_id))
        })
}
