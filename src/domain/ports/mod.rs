//! Port trait definitions (hexagonal architecture).
//!
//! These async interfaces are the only couplings the core has to the outside
//! world: the reasoning oracle it queries and the participants it conducts.
//! Adapters implement them; the core never does.

pub mod oracle;
pub mod participant;

pub use oracle::{Oracle, OracleError};
pub use participant::{Participant, ParticipantError};
