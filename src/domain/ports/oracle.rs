//! Reasoning-oracle port.
//!
//! The oracle is the external reasoning service the controller queries for
//! free-text answers (fact sheets, plans) and for constrained structured-JSON
//! answers (the per-turn criteria battery). The core never implements it;
//! adapters do. Implementations must be `Send + Sync` so the controller can
//! hold them behind an `Arc` across await points.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::message::Message;

/// Errors an oracle adapter can surface.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle replied, but the structured output did not conform. This is
    /// the one error class the orchestration policy absorbs (by restarting
    /// the round) instead of propagating.
    #[error("structured response could not be parsed: {0}")]
    Parse(String),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle request failed: {0}")]
    Request(String),
}

/// Port trait for the external reasoning service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answer a prompt context with free text.
    async fn respond(&self, messages: &[Message]) -> Result<String, OracleError>;

    /// Answer a prompt context with a single JSON object.
    ///
    /// `schema_hint` is the JSON-schema text the prompt already embeds;
    /// adapters with a native constrained-output mode can pass it through.
    /// A reply that is not parseable JSON must surface as
    /// [`OracleError::Parse`], never as a panic.
    async fn respond_structured(
        &self,
        messages: &[Message],
        schema_hint: &str,
    ) -> Result<serde_json::Value, OracleError>;
}
