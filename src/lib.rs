//! Colloquy - Criteria-Driven Conversation Orchestrator
//!
//! Colloquy coordinates a fixed team of conversational participants toward a
//! task with a finite-state control loop. Each turn, an external reasoning
//! oracle is asked a structured battery of questions (is the request
//! satisfied? is progress being made? who speaks next? what should they be
//! told?) and the answers drive the state machine: execute the chosen step,
//! terminate on satisfaction, or rewrite the team's working memory and
//! restart when it stalls.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models (messages, memory, the state graph,
//!   criteria, reports), the error taxonomy, and the `Oracle`/`Participant`
//!   port traits implemented by adapters outside this crate
//! - **Service Layer** (`services`): the state-graph engine, the prompt
//!   assembly, the criteria policy, the default flow, and the orchestration
//!   controller
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use colloquy::{Orchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut orchestrator = Orchestrator::new(oracle, participants, OrchestratorConfig::default());
//!     let report = orchestrator.run("summarize the incident timeline").await?;
//!     println!("satisfied: {}", report.is_satisfied());
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{OrchestrationError, OrchestrationResult};
pub use domain::models::{
    Action, AnswerShape, Criterion, CriterionAnswer, HookDecision, Message, MemoryStore, NextStep,
    OrchestratorConfig, Role, RunReport, StateGraph, StateGraphBuilder, StateName, Termination,
    Transition, TurnContext,
};
pub use domain::ports::{Oracle, OracleError, Participant, ParticipantError};
pub use services::{Orchestrator, OrchestratorCore, StateGraphEngine, TraceEntry};
