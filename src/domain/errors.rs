//! Domain errors for the colloquy orchestration system.

use thiserror::Error;

use crate::domain::ports::oracle::OracleError;

/// Errors surfaced by the orchestration core.
///
/// Only oracle-shape errors ([`OrchestrationError::OracleParse`]) are ever
/// absorbed by the control loop itself (converted into a `RESET` transition);
/// everything else propagates unmodified to the caller. Budget exhaustion is
/// not an error: it is a normal termination path reported via `RunReport`.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("state graph is malformed: {0}")]
    Structural(String),

    #[error("oracle returned a malformed structured answer: {0}")]
    OracleParse(String),

    #[error("oracle request failed: {0}")]
    OracleUnavailable(String),

    #[error("participant '{name}' failed: {reason}")]
    Participant { name: String, reason: String },

    #[error("unknown state '{0}' reached at runtime")]
    UnknownState(String),

    #[error("invalid orchestration setup: {0}")]
    InvalidSetup(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

impl From<OracleError> for OrchestrationError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Parse(reason) => OrchestrationError::OracleParse(reason),
            other => OrchestrationError::OracleUnavailable(other.to_string()),
        }
    }
}
