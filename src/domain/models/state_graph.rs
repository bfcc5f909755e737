//! Declarative state graph: states, per-state action lists, transitions.
//!
//! The graph is pure policy data. It is constructed once, validated before
//! any execution, and immutable thereafter; the engine that interprets it
//! lives in `services::engine`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::context::TurnContext;
use crate::domain::ports::participant::Participant;

/// State tag drawn from a closed, policy-defined set.
pub type StateName = String;

/// Boxed async closure run as a state action. A returned string is wrapped
/// into a user-role message and appended to the transcripts.
pub type ActionFn = Arc<
    dyn for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, OrchestrationResult<Option<String>>>
        + Send
        + Sync,
>;

/// Boxed async closure deciding the next state.
pub type DecisionFn = Arc<
    dyn for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, OrchestrationResult<StateName>>
        + Send
        + Sync,
>;

/// One step in a state's ordered action list.
#[derive(Clone)]
pub enum Action {
    /// Run a policy function against the shared context.
    Function(ActionFn),

    /// Append a fixed message to the transcripts.
    Static(String),

    /// Ask a participant to act on a copy of the orchestrated transcript and
    /// append its reply.
    Invoke(Arc<dyn Participant>),
}

impl Action {
    pub fn function<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, OrchestrationResult<Option<String>>>
            + Send
            + Sync
            + 'static,
    {
        Action::Function(Arc::new(f))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Function(_) => f.write_str("Action::Function"),
            Action::Static(text) => write!(f, "Action::Static({text:?})"),
            Action::Invoke(p) => write!(f, "Action::Invoke({})", p.name()),
        }
    }
}

/// Rule selecting the successor of a state.
#[derive(Clone)]
pub enum Transition {
    /// Unconditional successor.
    Static(StateName),

    /// Successor chosen by a decision function (possibly a hook chain).
    Decide(DecisionFn),
}

impl Transition {
    pub fn to(target: impl Into<StateName>) -> Self {
        Transition::Static(target.into())
    }

    pub fn decide<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut TurnContext) -> BoxFuture<'a, OrchestrationResult<StateName>>
            + Send
            + Sync
            + 'static,
    {
        Transition::Decide(Arc::new(f))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Static(target) => write!(f, "Transition::Static({target:?})"),
            Transition::Decide(_) => f.write_str("Transition::Decide"),
        }
    }
}

/// A validated, reusable definition of a finite chat-control flow.
pub struct StateGraph {
    states: HashMap<StateName, Vec<Action>>,
    transitions: HashMap<StateName, Transition>,
    initial_state: StateName,
    final_states: HashSet<StateName>,
    max_transitions: u32,
}

impl StateGraph {
    pub fn builder() -> StateGraphBuilder {
        StateGraphBuilder::default()
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    pub fn max_transitions(&self) -> u32 {
        self.max_transitions
    }

    /// The ordered action list for a state, if declared.
    pub fn actions(&self, state: &str) -> Option<&[Action]> {
        self.states.get(state).map(Vec::as_slice)
    }

    /// The transition rule for a state, if declared.
    pub fn transition(&self, state: &str) -> Option<&Transition> {
        self.transitions.get(state)
    }

    /// Structural validation; idempotent and side-effect-free.
    ///
    /// Must run once before any execution. Decision-function targets cannot
    /// be checked statically; the engine reports those at runtime.
    pub fn validate(&self) -> OrchestrationResult<()> {
        if self.initial_state.is_empty() {
            return Err(OrchestrationError::Structural(
                "initial state is not defined".to_string(),
            ));
        }
        if !self.states.contains_key(&self.initial_state) {
            return Err(OrchestrationError::Structural(format!(
                "initial state '{}' is not a declared state",
                self.initial_state
            )));
        }
        if self.final_states.is_empty() {
            return Err(OrchestrationError::Structural(
                "no final states defined".to_string(),
            ));
        }
        for state in &self.final_states {
            if !self.states.contains_key(state) {
                return Err(OrchestrationError::Structural(format!(
                    "final state '{state}' is not a declared state"
                )));
            }
        }
        for state in self.states.keys() {
            match self.transitions.get(state) {
                None => {
                    return Err(OrchestrationError::Structural(format!(
                        "no transition defined for state '{state}'"
                    )));
                }
                Some(Transition::Static(target)) => {
                    if !self.states.contains_key(target) {
                        return Err(OrchestrationError::Structural(format!(
                            "state '{state}' transitions to undeclared state '{target}'"
                        )));
                    }
                }
                Some(Transition::Decide(_)) => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("initial_state", &self.initial_state)
            .field("final_states", &self.final_states)
            .field("max_transitions", &self.max_transitions)
            .finish()
    }
}

/// Builder for [`StateGraph`]. Validation is deferred to
/// [`StateGraph::validate`] so a malformed graph can still be inspected.
#[derive(Default)]
pub struct StateGraphBuilder {
    states: HashMap<StateName, Vec<Action>>,
    transitions: HashMap<StateName, Transition>,
    initial_state: StateName,
    final_states: HashSet<StateName>,
    max_transitions: Option<u32>,
}

impl StateGraphBuilder {
    pub fn state(mut self, name: impl Into<StateName>, actions: Vec<Action>) -> Self {
        self.states.insert(name.into(), actions);
        self
    }

    pub fn transition(mut self, name: impl Into<StateName>, transition: Transition) -> Self {
        self.transitions.insert(name.into(), transition);
        self
    }

    pub fn initial(mut self, name: impl Into<StateName>) -> Self {
        self.initial_state = name.into();
        self
    }

    pub fn terminal(mut self, name: impl Into<StateName>) -> Self {
        self.final_states.insert(name.into());
        self
    }

    pub fn max_transitions(mut self, limit: u32) -> Self {
        self.max_transitions = Some(limit);
        self
    }

    pub fn build(self) -> StateGraph {
        StateGraph {
            states: self.states,
            transitions: self.transitions,
            initial_state: self.initial_state,
            final_states: self.final_states,
            max_transitions: self.max_transitions.unwrap_or(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_graph() -> StateGraphBuilder {
        StateGraph::builder()
            .initial("start")
            .terminal("done")
            .state("start", vec![Action::Static("hello".to_string())])
            .transition("start", Transition::to("done"))
            .state("done", vec![])
            .transition("done", Transition::to("done"))
    }

    #[test]
    fn test_well_formed_graph_validates() {
        let graph = two_state_graph().build();
        assert!(graph.validate().is_ok());
        // Idempotent.
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_missing_transition_entry_fails() {
        let graph = StateGraph::builder()
            .initial("start")
            .terminal("done")
            .state("start", vec![])
            .transition("start", Transition::to("done"))
            .state("done", vec![])
            .build();
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, OrchestrationError::Structural(_)));
    }

    #[test]
    fn test_undeclared_initial_state_fails() {
        let graph = StateGraph::builder()
            .initial("ghost")
            .terminal("done")
            .state("done", vec![])
            .transition("done", Transition::to("done"))
            .build();
        assert!(matches!(
            graph.validate(),
            Err(OrchestrationError::Structural(_))
        ));
    }

    #[test]
    fn test_empty_initial_state_fails() {
        let graph = StateGraph::builder()
            .terminal("done")
            .state("done", vec![])
            .transition("done", Transition::to("done"))
            .build();
        assert!(matches!(
            graph.validate(),
            Err(OrchestrationError::Structural(_))
        ));
    }

    #[test]
    fn test_no_final_states_fails() {
        let graph = StateGraph::builder()
            .initial("start")
            .state("start", vec![])
            .transition("start", Transition::to("start"))
            .build();
        assert!(matches!(
            graph.validate(),
            Err(OrchestrationError::Structural(_))
        ));
    }

    #[test]
    fn test_dangling_static_target_fails() {
        let graph = StateGraph::builder()
            .initial("start")
            .terminal("start")
            .state("start", vec![])
            .transition("start", Transition::to("nowhere"))
            .build();
        assert!(matches!(
            graph.validate(),
            Err(OrchestrationError::Structural(_))
        ));
    }
}
