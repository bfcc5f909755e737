//! Shared mutable context for one orchestration run.

use crate::domain::models::criterion::{Criterion, NextStep};
use crate::domain::models::memory::MemoryStore;
use crate::domain::models::message::Message;

/// The mutable bag of state threaded through actions, transitions, and hooks.
///
/// Exclusively owned by one controller run for its whole duration; it is
/// passed by mutable reference into the engine and never shared across
/// concurrent sessions.
pub struct TurnContext {
    /// The user request being addressed.
    pub task: String,

    /// Reusable description of the team (one "name: description" per line).
    pub team: String,

    /// Participant names, in roster order.
    pub names: Vec<String>,

    /// Saturating non-progress counter, floored at zero.
    pub stalled_count: u32,

    /// Total turns consumed across all inner passes of this run.
    pub total_turns: u32,

    /// The per-turn question battery, in prompt order.
    pub criteria: Vec<Criterion>,

    /// The most recent parsed next-step answer, if any.
    pub next_step: Option<NextStep>,

    /// The external conversation the run was started from; grows with the
    /// fact/plan derivation exchanges.
    pub conversation: Vec<Message>,

    /// Facts, plan, and the orchestrated-message log.
    pub memory: MemoryStore,
}

impl TurnContext {
    pub fn new(
        task: impl Into<String>,
        team: impl Into<String>,
        names: Vec<String>,
        criteria: Vec<Criterion>,
    ) -> Self {
        Self {
            task: task.into(),
            team: team.into(),
            names,
            stalled_count: 0,
            total_turns: 0,
            criteria,
            next_step: None,
            conversation: Vec::new(),
            memory: MemoryStore::new(),
        }
    }
}
