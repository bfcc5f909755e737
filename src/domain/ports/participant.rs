//! Team-participant port.
//!
//! A participant is a team member (human proxy or automated agent) capable of
//! receiving messages into its private history and producing a reply when
//! asked to act. How it produces that reply is outside the core.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::message::Message;

/// Errors a participant adapter can surface.
///
/// The core has no domain knowledge to recover from these; they propagate to
/// the caller unmodified.
#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("failed to produce a reply: {0}")]
    ReplyFailed(String),
}

/// Port trait for a single member of the orchestrated team.
#[async_trait]
pub trait Participant: Send + Sync {
    /// Unique speaker name, used for next-speaker selection and attribution.
    fn name(&self) -> &str;

    /// Short capability description shown to the oracle in the team roster.
    fn description(&self) -> &str;

    /// Deliver a message into this participant's private history without
    /// requesting a reply. `out_loud` marks the one delivery per broadcast
    /// that is addressed to the chosen speaker rather than made silently.
    async fn receive(&self, message: &Message, out_loud: bool) -> Result<(), ParticipantError>;

    /// Produce a reply given a copy of the orchestrated conversation history.
    async fn act(&self, history: &[Message]) -> Result<Message, ParticipantError>;

    /// Drop all private history. Called once per outer-loop round, before the
    /// participant is re-briefed.
    async fn reset_memory(&self);
}
