use foundry_runner::{AgentSession, RunEventProcessor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Config;

/// A processor waiting for an approval decision
pub struct ParkedRun {
    pub thread_id: String,
    pub processor: RunEventProcessor,
    pub parked_at: Instant,
}

/// Shared application state passed to all handlers
///
/// Processors of runs blocked on approval are parked here, keyed by run id,
/// until the approval endpoint picks them up again. Entries older than
/// `server.parked_run_ttl_secs` are dropped.
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<AgentSession>,
    runs: Mutex<HashMap<String, ParkedRun>>,
    parked_ttl: Duration,
}

impl AppState {
    pub fn new(config: Config, session: AgentSession) -> Self {
        let parked_ttl = config.server.parked_run_ttl();
        Self {
            config: Arc::new(config),
            session: Arc::new(session),
            runs: Mutex::new(HashMap::new()),
            parked_ttl,
        }
    }

    pub async fn park(&self, run_id: impl Into<String>, thread_id: impl Into<String>, processor: RunEventProcessor) {
        let run_id = run_id.into();
        tracing::debug!("Parking event processor for run {}", run_id);

        let mut runs = self.runs.lock().await;
        self.evict_expired(&mut runs);
        runs.insert(
            run_id,
            ParkedRun {
                thread_id: thread_id.into(),
                processor,
                parked_at: Instant::now(),
            },
        );
    }

    pub async fn take(&self, run_id: &str) -> Option<ParkedRun> {
        let mut runs = self.runs.lock().await;
        self.evict_expired(&mut runs);
        runs.remove(run_id)
    }

    pub async fn parked_count(&self) -> usize {
        let mut runs = self.runs.lock().await;
        self.evict_expired(&mut runs);
        runs.len()
    }

    /// Drop expired entries, returning how many were removed
    pub async fn sweep(&self) -> usize {
        let mut runs = self.runs.lock().await;
        self.evict_expired(&mut runs)
    }

    fn evict_expired(&self, runs: &mut HashMap<String, ParkedRun>) -> usize {
        let before = runs.len();
        runs.retain(|run_id, parked| {
            let keep = parked.parked_at.elapsed() < self.parked_ttl;
            if !keep {
                tracing::info!("Dropping run {} left waiting for approval", run_id);
            }
            keep
        });
        before - runs.len()
    }
}
