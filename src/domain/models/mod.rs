pub mod config;
pub mod context;
pub mod criterion;
pub mod memory;
pub mod message;
pub mod report;
pub mod state_graph;

pub use config::OrchestratorConfig;
pub use context::TurnContext;
pub use criterion::{AnswerShape, Criterion, CriterionAnswer, HookDecision, HookFn, NextStep};
pub use memory::MemoryStore;
pub use message::{Message, Role};
pub use report::{RunReport, Termination};
pub use state_graph::{Action, StateGraph, StateGraphBuilder, StateName, Transition};
