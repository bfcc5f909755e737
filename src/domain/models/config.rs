//! Controller configuration.

use std::time::Duration;

/// Tunables for one [`crate::services::Orchestrator`] instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Speaker name the controller signs its own messages with.
    pub name: String,

    /// Global turn budget across all inner passes of a run.
    pub max_turns: u32,

    /// Transition budget for a single inner pass of the state graph.
    pub max_transitions: u32,

    /// Consecutive (net) non-progress signals that trigger introspection.
    pub stall_threshold: u32,

    /// Optional wall-clock limit on each oracle call.
    pub oracle_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: "orchestrator".to_string(),
            max_turns: 10,
            max_transitions: 64,
            stall_threshold: 3,
            oracle_timeout: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_max_transitions(mut self, max_transitions: u32) -> Self {
        self.max_transitions = max_transitions;
        self
    }

    pub fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = Some(timeout);
        self
    }
}
