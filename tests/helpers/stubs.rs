//! Scripted oracle and stub participants for driving full orchestration runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use colloquy::{Message, Oracle, OracleError, Participant, ParticipantError};

/// Oracle that replays scripted replies in order. Free-text falls back to
/// "ack" when the script runs dry; structured answers fall back to the
/// configured default, or a parse error if there is none.
#[derive(Default)]
pub struct ScriptedOracle {
    free: Mutex<VecDeque<String>>,
    structured: Mutex<VecDeque<Value>>,
    structured_default: Option<Value>,
}

impl ScriptedOracle {
    pub fn with_free(self, replies: Vec<&str>) -> Self {
        *self.free.lock().unwrap() = replies.into_iter().map(String::from).collect();
        self
    }

    pub fn with_structured(self, replies: Vec<Value>) -> Self {
        *self.structured.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_structured_default(mut self, value: Value) -> Self {
        self.structured_default = Some(value);
        self
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn respond(&self, _messages: &[Message]) -> Result<String, OracleError> {
        Ok(self
            .free
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ack".to_string()))
    }

    async fn respond_structured(
        &self,
        _messages: &[Message],
        _schema_hint: &str,
    ) -> Result<Value, OracleError> {
        if let Some(value) = self.structured.lock().unwrap().pop_front() {
            return Ok(value);
        }
        self.structured_default
            .clone()
            .ok_or_else(|| OracleError::Parse("structured script exhausted".to_string()))
    }
}

/// Participant that records deliveries and replays scripted replies.
pub struct StubParticipant {
    name: String,
    description: String,
    inbox: Mutex<Vec<(Message, bool)>>,
    replies: Mutex<VecDeque<String>>,
    resets: AtomicU32,
    act_count: AtomicU32,
}

impl StubParticipant {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inbox: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            resets: AtomicU32::new(0),
            act_count: AtomicU32::new(0),
        }
    }

    pub fn with_replies(self, replies: Vec<&str>) -> Self {
        *self.replies.lock().unwrap() = replies.into_iter().map(String::from).collect();
        self
    }

    /// Every delivery since the last memory reset, with its out-loud flag.
    pub fn inbox(&self) -> Vec<(Message, bool)> {
        self.inbox.lock().unwrap().clone()
    }

    pub fn acts(&self) -> u32 {
        self.act_count.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Participant for StubParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn receive(&self, message: &Message, out_loud: bool) -> Result<(), ParticipantError> {
        self.inbox.lock().unwrap().push((message.clone(), out_loud));
        Ok(())
    }

    async fn act(&self, _history: &[Message]) -> Result<Message, ParticipantError> {
        self.act_count.fetch_add(1, Ordering::SeqCst);
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ack".to_string());
        Ok(Message::assistant(text).with_name(self.name.clone()))
    }

    async fn reset_memory(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.inbox.lock().unwrap().clear();
    }
}

/// A well-formed structured answer for the default criteria battery.
pub fn step_value(satisfied: bool, progress: bool, speaker: &str, instruction: &str) -> Value {
    json!({
        "is_request_satisfied": {"reason": "scripted", "answer": satisfied},
        "is_progress_being_made": {"reason": "scripted", "answer": progress},
        "next_speaker": {"reason": "scripted", "answer": speaker},
        "instruction_or_question": {"reason": "scripted", "answer": instruction},
    })
}
