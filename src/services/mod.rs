//! Service layer: the engine, the policy, and the controller.

pub mod criteria;
pub mod engine;
pub mod flow;
pub mod orchestrator;
pub mod prompts;

pub use engine::{StateGraphEngine, TraceEntry};
pub use orchestrator::{Orchestrator, OrchestratorCore};
