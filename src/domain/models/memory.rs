//! Working memory for one orchestration session.
//!
//! Holds the evolving `facts` and `plan` text blobs together with the
//! orchestrated-message log: the controller's private transcript of its own
//! turn-taking decisions and the replies it collected. The log is append-only
//! and single-writer; readers get copies via [`MemoryStore::snapshot`].

use serde::Serialize;

use crate::domain::models::message::Message;

/// Facts, plan, and the orchestrated-message log for one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStore {
    /// The current fact sheet, rewritten on introspection.
    pub facts: String,

    /// The current bullet-point plan. Metadata, not a conversational turn.
    pub plan: String,

    transcript: Vec<Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the orchestrated log at the start of a round. Facts and plan
    /// survive so the next round's briefing can be rebuilt from them.
    pub fn begin_round(&mut self) {
        self.transcript.clear();
    }

    /// Append a message to the orchestrated log.
    pub fn append(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// The orchestrated log, in append order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// A copy of the orchestrated log, safe to hand to any consumer.
    pub fn snapshot(&self) -> Vec<Message> {
        self.transcript.clone()
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_round_clears_transcript_but_keeps_facts_and_plan() {
        let mut memory = MemoryStore::new();
        memory.facts = "known facts".to_string();
        memory.plan = "the plan".to_string();
        memory.append(Message::user("turn one"));
        assert_eq!(memory.len(), 1);

        memory.begin_round();
        assert!(memory.is_empty());
        assert_eq!(memory.facts, "known facts");
        assert_eq!(memory.plan, "the plan");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut memory = MemoryStore::new();
        memory.append(Message::user("original"));

        let mut copy = memory.snapshot();
        copy.push(Message::user("extra"));

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.transcript()[0].content, "original");
    }
}
