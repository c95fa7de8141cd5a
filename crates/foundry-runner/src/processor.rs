use crate::steps::{pending_tool_calls, tool_calls_step_event};
use foundry_agents::{AgentsClient, ListOrder, RunStatus, RunStep, StepType, ThreadRun};
use foundry_types::{
    ErrorEvent, MessageEvent, RequiresApprovalEvent, RunCompletedEvent, RunEvent, DEFAULT_POLL_INTERVAL,
};
use futures::Stream;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Where a processor is in the lifecycle of its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorPhase {
    /// Not yet bound to a run
    Idle,
    Polling,
    /// An approval request was delivered; waiting for `unblock()`
    Blocked,
    Completed,
    Failed,
}

impl ProcessorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessorPhase::Completed | ProcessorPhase::Failed)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("run {run_id} is waiting for an approval decision, call unblock() first")]
    Blocked { run_id: String },

    #[error("run {run_id} already finished")]
    Finished { run_id: String },

    #[error("processor is bound to {bound} and cannot poll {requested}")]
    RunMismatch { bound: String, requested: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunBinding {
    thread_id: String,
    run_id: String,
}

impl RunBinding {
    fn describe(&self) -> String {
        format!("{}/{}", self.thread_id, self.run_id)
    }
}

/// Turns a polled remote run into a deduplicated, ordered stream of events
///
/// One processor serves exactly one run. It is driven by its owner only, one
/// event at a time, and is resumable across approval pauses:
///
/// ```text
/// Idle -> Polling -> { Polling, Blocked, Completed, Failed }
/// Blocked --unblock()--> Polling
/// ```
///
/// Every event handed out is recorded in a seen-set keyed by its `event_id`
/// and is never handed out again by the same processor.
pub struct RunEventProcessor {
    client: Arc<dyn AgentsClient>,
    binding: Option<RunBinding>,
    seen: HashSet<String>,
    phase: ProcessorPhase,
    blocked_event: Option<RequiresApprovalEvent>,
    pending: VecDeque<RunEvent>,
    poll_interval: Duration,
    sleep_before_read: bool,
}

impl RunEventProcessor {
    pub fn new(client: Arc<dyn AgentsClient>) -> Self {
        Self {
            client,
            binding: None,
            seen: HashSet::new(),
            phase: ProcessorPhase::Idle,
            blocked_event: None,
            pending: VecDeque::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            sleep_before_read: false,
        }
    }

    pub fn phase(&self) -> ProcessorPhase {
        self.phase
    }

    pub fn is_blocked(&self) -> bool {
        self.phase == ProcessorPhase::Blocked
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The approval request the processor is currently paused on
    pub fn blocked_event(&self) -> Option<&RequiresApprovalEvent> {
        self.blocked_event.as_ref()
    }

    pub fn has_seen(&self, event_id: &str) -> bool {
        self.seen.contains(event_id)
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.thread_id.as_str())
    }

    pub fn run_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.run_id.as_str())
    }

    /// Start (or resume) pulling events for a run
    ///
    /// The first call binds the processor to `(thread_id, run_id)`. Later calls
    /// must name the same pair and are only accepted while polling, which is
    /// the state `unblock()` returns to.
    pub fn poll_run_events(
        &mut self,
        thread_id: &str,
        run_id: &str,
        poll_interval: Duration,
    ) -> Result<RunEvents<'_>, ProcessorError> {
        let requested = RunBinding {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        };

        if let Some(bound) = &self.binding {
            if *bound != requested {
                return Err(ProcessorError::RunMismatch {
                    bound: bound.describe(),
                    requested: requested.describe(),
                });
            }
        }

        match self.phase {
            ProcessorPhase::Blocked => {
                return Err(ProcessorError::Blocked {
                    run_id: run_id.to_string(),
                })
            }
            ProcessorPhase::Completed | ProcessorPhase::Failed => {
                return Err(ProcessorError::Finished {
                    run_id: run_id.to_string(),
                })
            }
            ProcessorPhase::Idle | ProcessorPhase::Polling => {}
        }

        if self.binding.is_none() {
            tracing::info!("Binding event processor to run {}", requested.describe());
            self.binding = Some(requested);
        }
        self.phase = ProcessorPhase::Polling;
        self.poll_interval = poll_interval;
        self.sleep_before_read = false;

        Ok(RunEvents { processor: self })
    }

    /// Resume polling after the approval decision has been submitted
    ///
    /// No-op unless the processor is blocked.
    pub fn unblock(&mut self) {
        if self.phase != ProcessorPhase::Blocked {
            tracing::debug!("unblock() called while {:?}, ignoring", self.phase);
            return;
        }

        tracing::info!("Unblocking event processor for run {:?}", self.run_id());
        self.phase = ProcessorPhase::Polling;
        self.blocked_event = None;
        self.sleep_before_read = false;
    }

    /// Next event of the bound run, or `None` once blocked or finished
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            if self.phase != ProcessorPhase::Polling {
                return None;
            }
            let binding = self.binding.clone()?;

            if self.sleep_before_read {
                tokio::time::sleep(self.poll_interval).await;
            }
            self.sleep_before_read = true;

            self.poll_once(&binding).await;
        }
    }

    /// One remote read: fetch the run, then queue whatever it made ready
    async fn poll_once(&mut self, binding: &RunBinding) {
        let run = match self.client.get_run(&binding.thread_id, &binding.run_id).await {
            Ok(run) => run,
            Err(e) => {
                tracing::error!("Error polling run {}: {:#}", binding.run_id, e);
                self.fail(ErrorEvent::new(format!("{:#}", e), None));
                return;
            }
        };
        tracing::info!("Run {} status: {}", run.id, run.status);

        match run.status {
            RunStatus::RequiresAction => self.handle_required_action(binding, &run),
            RunStatus::Queued | RunStatus::InProgress => {
                if let Err(e) = self.sweep_steps(binding).await {
                    tracing::error!("Error listing steps for run {}: {:#}", binding.run_id, e);
                    self.fail(ErrorEvent::new(format!("{:#}", e), None));
                }
            }
            _ => self.finish(binding, &run).await,
        }
    }

    fn handle_required_action(&mut self, binding: &RunBinding, run: &ThreadRun) {
        let Some(tool_calls) = run.pending_approvals() else {
            let kind = run
                .required_action
                .as_ref()
                .map(|action| action.kind())
                .unwrap_or("none");
            tracing::error!("Run {} requires unsupported action: {}", run.id, kind);
            self.fail(ErrorEvent::new(
                format!("Run requires an unsupported action: {}", kind),
                Some("unsupported_required_action".to_string()),
            ));
            return;
        };

        let event = RequiresApprovalEvent::new(
            run.id.clone(),
            binding.thread_id.clone(),
            pending_tool_calls(tool_calls),
        );

        if !self.seen.insert(event.event_id()) {
            tracing::info!(
                "Skipping already-seen approval request {}, continuing polling",
                event.event_id()
            );
            return;
        }

        tracing::info!(
            "Run {} blocked on approval for {} tool call(s)",
            run.id,
            event.tool_calls.len()
        );
        self.phase = ProcessorPhase::Blocked;
        self.blocked_event = Some(event.clone());
        self.pending.push_back(event.into());
    }

    async fn finish(&mut self, binding: &RunBinding, run: &ThreadRun) {
        tracing::info!("Run {} finished with status {}, doing final sweep", run.id, run.status);
        if let Err(e) = self.sweep_steps(binding).await {
            tracing::warn!("Final step sweep for run {} failed: {:#}", run.id, e);
        }

        match run.status {
            RunStatus::Completed => {
                let event = RunCompletedEvent::new(run.id.clone());
                if self.seen.insert(event.event_id()) {
                    self.pending.push_back(event.into());
                }
                self.phase = ProcessorPhase::Completed;
            }
            RunStatus::Failed => {
                let last_error = run.last_error.clone().unwrap_or_default();
                let message = last_error.message.unwrap_or_else(|| "Run failed".to_string());
                tracing::error!("Run {} failed: {}", run.id, message);
                self.fail(ErrorEvent::new(message, last_error.code));
            }
            status => {
                tracing::error!("Run {} ended with status {}", run.id, status);
                self.fail(ErrorEvent::new(
                    format!("Run ended with status {}", status),
                    Some(status.as_str().to_string()),
                ));
            }
        }
    }

    fn fail(&mut self, event: ErrorEvent) {
        if self.seen.insert(event.event_id()) {
            self.pending.push_back(event.into());
        }
        self.phase = ProcessorPhase::Failed;
    }

    /// Walk every step in creation order and queue the newly ready ones
    ///
    /// Stops at the first completed tool-calls step whose outputs are not all
    /// in yet, so a later step is never reported ahead of an earlier one.
    async fn sweep_steps(&mut self, binding: &RunBinding) -> anyhow::Result<()> {
        let steps = self
            .client
            .list_steps(&binding.thread_id, &binding.run_id, ListOrder::Asc)
            .await?;

        for step in &steps {
            if !step.is_completed() {
                tracing::debug!("Skipping step {}: not completed ({:?})", step.id, step.status);
                continue;
            }

            match step.step_type {
                StepType::ToolCalls => {
                    if !self.queue_tool_calls_step(step) {
                        tracing::info!(
                            "Tool calls step {} has no output yet, stopping sweep to preserve order",
                            step.id
                        );
                        break;
                    }
                }
                StepType::MessageCreation => self.queue_message(binding, step).await,
                StepType::Unknown => {
                    tracing::debug!("Skipping step {} of unknown type", step.id);
                }
            }
        }

        Ok(())
    }

    /// Returns false when the sweep must stop at this step
    fn queue_tool_calls_step(&mut self, step: &RunStep) -> bool {
        if self.seen.contains(&format!("step_{}", step.id)) {
            tracing::debug!("Skipping tool calls step {}: already seen", step.id);
            return true;
        }

        let Some(event) = tool_calls_step_event(step) else {
            tracing::warn!("Step {} has no tool_calls in step_details", step.id);
            return true;
        };

        if !event.all_outputs_ready() {
            return false;
        }

        tracing::info!(
            "Tool calls step {} ready with {} tool(s)",
            step.id,
            event.tool_calls.len()
        );
        self.seen.insert(event.event_id());
        self.pending.push_back(event.into());
        true
    }

    async fn queue_message(&mut self, binding: &RunBinding, step: &RunStep) {
        let Some(message_id) = step.step_details.message_id() else {
            tracing::warn!("Step {} has no message reference", step.id);
            return;
        };

        if self.seen.contains(&format!("message_{}", message_id)) {
            tracing::debug!("Skipping message {}: already seen", message_id);
            return;
        }

        let message = match self.client.get_message(&binding.thread_id, message_id).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Error fetching message {}: {:#}", message_id, e);
                return;
            }
        };

        let Some(content) = message.text_value() else {
            tracing::debug!("Message {} has no text content", message_id);
            return;
        };

        let event = MessageEvent::new(message_id, content);
        tracing::info!("Message {} ready", message_id);
        self.seen.insert(event.event_id());
        self.pending.push_back(event.into());
    }
}

impl std::fmt::Debug for RunEventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEventProcessor")
            .field("binding", &self.binding)
            .field("phase", &self.phase)
            .field("seen", &self.seen.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Pull handle over one [`RunEventProcessor::poll_run_events`] call
///
/// Finite: ends at a blocking approval request or at the terminal event.
pub struct RunEvents<'a> {
    processor: &'a mut RunEventProcessor,
}

impl<'a> RunEvents<'a> {
    pub async fn next(&mut self) -> Option<RunEvent> {
        self.processor.next_event().await
    }

    /// Drain every remaining event into a vector
    pub async fn collect(mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> impl Stream<Item = RunEvent> + Send + 'a {
        futures::stream::unfold(self, |mut events| async move {
            let event = events.next().await?;
            Some((event, events))
        })
    }
}
