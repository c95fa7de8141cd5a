use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use foundry_agents::{
    AgentThread, AgentsClient, CreateRunRequest, ListOrder, RunStep, ThreadMessage, ThreadRun,
    ToolApproval,
};
use foundry_api::{build_router, config::Config, error::ApiError, AppState};
use foundry_runner::AgentSession;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = false
    origins = []

    [foundry]
    endpoint = "https://res.services.ai.azure.com/api/projects/test"
    agent_id = "asst_1"

    [run]
    instructions = "Be brief"
    require_approval = true
    poll_interval_ms = 0
    max_poll_attempts = 5

    [logging]
    level = "info"
    format = "pretty"
"#;

/// Agents service that walks one run through a fixed list of snapshots
#[derive(Default)]
struct FakeAgents {
    snapshots: Vec<Value>,
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    reads: usize,
    approvals: Vec<Vec<ToolApproval>>,
}

impl FakeAgents {
    fn new(snapshots: Vec<Value>) -> Self {
        Self {
            snapshots,
            ..Default::default()
        }
    }

    fn current(&self, state: &FakeState) -> Result<&Value> {
        let index = state.reads.saturating_sub(1).min(self.snapshots.len().saturating_sub(1));
        self.snapshots.get(index).ok_or_else(|| anyhow!("no snapshots"))
    }
}

#[async_trait]
impl AgentsClient for FakeAgents {
    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<ThreadRun> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(serde_json::from_value(self.current(&state)?["run"].clone())?)
    }

    async fn list_steps(&self, _thread_id: &str, _run_id: &str, _order: ListOrder) -> Result<Vec<RunStep>> {
        let state = self.state.lock().unwrap();
        Ok(serde_json::from_value(self.current(&state)?["steps"].clone())?)
    }

    async fn get_message(&self, thread_id: &str, message_id: &str) -> Result<ThreadMessage> {
        Ok(serde_json::from_value(json!({
            "id": message_id,
            "thread_id": thread_id,
            "role": "assistant",
            "run_id": "run_1",
            "content": [{"type": "text", "text": {"value": "Here are your files", "annotations": []}}]
        }))?)
    }

    async fn list_messages(&self, thread_id: &str, _order: ListOrder) -> Result<Vec<ThreadMessage>> {
        Ok(vec![serde_json::from_value(json!({
            "id": "msg_1",
            "thread_id": thread_id,
            "role": "user",
            "content": [{"type": "text", "text": {"value": "hello"}}]
        }))?])
    }

    async fn create_thread(&self) -> Result<AgentThread> {
        Ok(AgentThread {
            id: "thread_1".to_string(),
            created_at: None,
        })
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        Ok(serde_json::from_value(json!({
            "id": "msg_user",
            "thread_id": thread_id,
            "role": "user",
            "content": [{"type": "text", "text": {"value": content}}]
        }))?)
    }

    async fn create_run(&self, thread_id: &str, _request: CreateRunRequest) -> Result<ThreadRun> {
        Ok(serde_json::from_value(
            json!({"id": "run_1", "thread_id": thread_id, "status": "queued"}),
        )?)
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: Vec<ToolApproval>,
    ) -> Result<ThreadRun> {
        self.state.lock().unwrap().approvals.push(approvals);
        Ok(serde_json::from_value(
            json!({"id": run_id, "thread_id": thread_id, "status": "in_progress"}),
        )?)
    }
}

fn approval_snapshot() -> Value {
    json!({
        "run": {
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_approval",
                "submit_tool_approval": {"tool_calls": [
                    {"id": "tc1", "type": "mcp", "name": "list_files", "server_label": "graph",
                     "arguments": "{\"folder\": \"root\"}"}
                ]}
            }
        },
        "steps": []
    })
}

fn completed_snapshot() -> Value {
    json!({
        "run": {"id": "run_1", "thread_id": "thread_1", "status": "completed"},
        "steps": [{
            "id": "step_m1",
            "type": "message_creation",
            "status": "completed",
            "step_details": {"type": "message_creation", "message_creation": {"message_id": "m1"}}
        }]
    })
}

fn setup(snapshots: Vec<Value>) -> (Arc<AppState>, Arc<FakeAgents>) {
    setup_with(toml::from_str(CONFIG).unwrap(), snapshots)
}

fn setup_with(config: Config, snapshots: Vec<Value>) -> (Arc<AppState>, Arc<FakeAgents>) {
    let client = Arc::new(FakeAgents::new(snapshots));
    let session = AgentSession::builder()
        .client(client.clone())
        .agent_id(config.foundry.agent_id.clone())
        .run_options(config.run_options())
        .poll_config(config.poll_config())
        .build()
        .unwrap();

    (Arc::new(AppState::new(config, session)), client)
}

async fn send(state: &Arc<AppState>, method: &str, uri: &str, body: Option<Value>) -> Response {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    build_router(state.clone()).oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (state, _) = setup(vec![]);

    let response = send(&state, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["agent"], "asst_1");
    assert_eq!(body["services"]["parked_runs"], "0");
}

#[tokio::test]
async fn test_create_thread_and_list_messages() {
    let (state, _) = setup(vec![]);

    let response = send(&state, "POST", "/threads", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["thread_id"], "thread_1");

    let response = send(&state, "GET", "/threads/thread_1/messages", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["messages"][0]["content"], "hello");
    assert_eq!(body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_stream_parks_on_approval_and_resumes() {
    let (state, client) = setup(vec![approval_snapshot(), completed_snapshot()]);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/messages",
        Some(json!({"content": "List my files"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_text(response).await;

    assert!(first.contains("event: requires_approval"));
    assert!(first.contains("id: approval_run_1_tc1"));
    assert!(!first.contains("event: completed"));
    assert_eq!(state.parked_count().await, 1);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/runs/run_1/approval",
        Some(json!({"approve": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_text(response).await;

    assert!(second.contains("event: message"));
    assert!(second.contains("Here are your files"));
    assert!(second.contains("event: completed"));
    assert!(!second.contains("event: requires_approval"));
    assert!(second.find("event: message").unwrap() < second.find("event: completed").unwrap());
    assert_eq!(state.parked_count().await, 0);

    let approvals = client.state.lock().unwrap().approvals.clone();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0][0].tool_call_id, "tc1");
    assert!(approvals[0][0].approve);
}

#[tokio::test]
async fn test_approval_for_unknown_run() {
    let (state, _) = setup(vec![completed_snapshot()]);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/runs/run_404/approval",
        Some(json!({"approve": false})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Run not found: run_404");
}

#[tokio::test]
async fn test_approval_for_wrong_thread_keeps_run_parked() {
    let (state, _) = setup(vec![approval_snapshot()]);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/messages",
        Some(json!({"content": "List my files"})),
    )
    .await;
    body_text(response).await;
    assert_eq!(state.parked_count().await, 1);

    let response = send(
        &state,
        "POST",
        "/threads/thread_2/runs/run_1/approval",
        Some(json!({"approve": true})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.parked_count().await, 1);
}

#[tokio::test]
async fn test_parked_run_expires() {
    let mut config: Config = toml::from_str(CONFIG).unwrap();
    config.server.parked_run_ttl_secs = 30;
    let (state, client) = setup_with(config, vec![approval_snapshot(), completed_snapshot()]);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/messages",
        Some(json!({"content": "List my files"})),
    )
    .await;
    body_text(response).await;
    assert_eq!(state.parked_count().await, 1);

    tokio::time::pause();
    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(state.parked_count().await, 1);

    tokio::time::advance(Duration::from_secs(21)).await;
    assert_eq!(state.parked_count().await, 0);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/runs/run_1/approval",
        Some(json!({"approve": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(client.state.lock().unwrap().approvals.is_empty());
}

#[tokio::test]
async fn test_sweep_drops_only_expired_runs() {
    let mut config: Config = toml::from_str(CONFIG).unwrap();
    config.server.parked_run_ttl_secs = 30;
    let (state, _) = setup_with(config, vec![approval_snapshot()]);

    tokio::time::pause();
    state.park("run_old", "thread_1", state.session.processor()).await;
    tokio::time::advance(Duration::from_secs(20)).await;
    state.park("run_new", "thread_1", state.session.processor()).await;
    tokio::time::advance(Duration::from_secs(15)).await;

    assert_eq!(state.sweep().await, 1);
    assert!(state.take("run_old").await.is_none());
    assert_eq!(state.take("run_new").await.map(|run| run.thread_id), Some("thread_1".to_string()));
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (state, _) = setup(vec![]);

    let response = send(
        &state,
        "POST",
        "/threads/thread_1/messages",
        Some(json!({"content": "   "})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_error_response() {
    let response = ApiError::BadRequest("Test error".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ApiError::Agents(anyhow!("boom")).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = ApiError::Conflict("busy".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
