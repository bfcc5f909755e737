//! Terminal verdict of an orchestration run.

use crate::domain::models::context::TurnContext;
use crate::domain::models::message::Message;

/// How a run ended. Hard failures are reported as errors, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The oracle judged the request fully satisfied.
    Satisfied,

    /// The global turn budget ran out before satisfaction.
    BudgetExhausted,
}

/// What the controller hands back when the outer loop ends.
///
/// The final facts, plan, and orchestrated transcript are surfaced rather
/// than discarded, so the caller can extract whatever output the last round
/// produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub termination: Termination,
    pub turns_used: u32,
    pub rounds: u32,
    pub facts: String,
    pub plan: String,
    pub transcript: Vec<Message>,
}

impl RunReport {
    pub(crate) fn new(termination: Termination, ctx: &TurnContext, rounds: u32) -> Self {
        Self {
            termination,
            turns_used: ctx.total_turns,
            rounds,
            facts: ctx.memory.facts.clone(),
            plan: ctx.memory.plan.clone(),
            transcript: ctx.memory.snapshot(),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.termination == Termination::Satisfied
    }

    /// The legacy `(success, verdict)` surface: `Some("TERMINATE")` when the
    /// request was satisfied, `None` when the budget ran out.
    pub fn verdict(&self) -> Option<&'static str> {
        match self.termination {
            Termination::Satisfied => Some("TERMINATE"),
            Termination::BudgetExhausted => None,
        }
    }
}
