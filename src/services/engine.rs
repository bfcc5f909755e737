//! State-graph execution engine.
//!
//! The engine interprets one state at a time: it runs the state's ordered
//! actions against the shared context, then evaluates the transition rule to
//! obtain the next state name. It is stateless between calls except for an
//! append-only execution trace kept for observability.
//!
//! Failure semantics: an action or transition error is never retried here —
//! it propagates. Recovery (e.g. the malformed-oracle-answer restart) is a
//! policy responsibility encoded in the transitions themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::context::TurnContext;
use crate::domain::models::message::Message;
use crate::domain::models::state_graph::{Action, StateGraph, StateName, Transition};

/// One executed state, recorded in the trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub state: StateName,
    pub turn: u32,
    pub at: DateTime<Utc>,
}

/// Executes states of a [`StateGraph`] against a [`TurnContext`].
#[derive(Debug, Default)]
pub struct StateGraphEngine {
    history: Vec<TraceEntry>,
}

impl StateGraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executed states in order, across all passes of this engine's lifetime.
    /// Written by the engine only; never read back by it.
    pub fn history(&self) -> &[TraceEntry] {
        &self.history
    }

    /// Run one state: every action in declared order, then the transition.
    /// Returns the next state name.
    pub async fn run_state(
        &mut self,
        graph: &StateGraph,
        state: &str,
        ctx: &mut TurnContext,
    ) -> OrchestrationResult<StateName> {
        let actions = graph
            .actions(state)
            .ok_or_else(|| OrchestrationError::UnknownState(state.to_string()))?;

        for action in actions {
            match action {
                Action::Function(f) => {
                    if let Some(text) = f(ctx).await? {
                        Self::record(ctx, Message::user(text));
                    }
                }
                Action::Static(text) => {
                    Self::record(ctx, Message::user(text.clone()));
                }
                Action::Invoke(participant) => {
                    let history = ctx.memory.snapshot();
                    let mut reply = participant.act(&history).await.map_err(|e| {
                        OrchestrationError::Participant {
                            name: participant.name().to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    if reply.name.is_none() {
                        reply.name = Some(participant.name().to_string());
                    }
                    Self::record(ctx, reply);
                }
            }
        }

        let next = match graph
            .transition(state)
            .ok_or_else(|| OrchestrationError::UnknownState(state.to_string()))?
        {
            Transition::Static(target) => target.clone(),
            Transition::Decide(decide) => decide(ctx).await?,
        };

        self.history.push(TraceEntry {
            state: state.to_string(),
            turn: ctx.total_turns,
            at: Utc::now(),
        });
        tracing::debug!(state = %state, next = %next, turn = ctx.total_turns, "ran state");
        Ok(next)
    }

    /// An action result lands in both the external conversation and the
    /// orchestrated-message log.
    fn record(ctx: &mut TurnContext, message: Message) {
        ctx.conversation.push(message.clone());
        ctx.memory.append(message);
    }
}
