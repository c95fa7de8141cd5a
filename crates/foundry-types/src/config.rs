use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLL_ATTEMPTS: usize = 60;

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant, you will respond to the user's message \
and you will use the tools provided to you to help the user. You will justify what tools you are going \
to use before requesting them.";

/// How often and how long to poll a remote run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub poll_interval: Duration,
    /// Upper bound for the simple reply poller; the event processor itself is unbounded
    pub max_attempts: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Per-run settings applied when a run is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    pub instructions: String,
    /// When false, tools run without asking and no approval events occur
    pub require_approval: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            require_approval: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_require_approval(mut self, required: bool) -> Self {
        self.require_approval = required;
        self
    }

    /// Approval mode string understood by the remote MCP tool definition
    pub fn approval_mode(&self) -> &'static str {
        if self.require_approval {
            "always"
        } else {
            "never"
        }
    }
}
