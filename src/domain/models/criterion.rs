//! Per-turn evaluation criteria and their structured answers.
//!
//! Each turn the policy asks the oracle a fixed battery of named questions
//! (criteria) in a single structured request. A criterion declares the
//! question text, the shape its answer must take, and optional hook functions
//! that run around next-step execution and may force an early transition.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::context::TurnContext;
use crate::domain::models::state_graph::StateName;

/// Outcome of a single hook invocation.
///
/// A hook either lets the chain continue toward its default successor state
/// or overrides the running state; the chain stops at the first override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Continue,
    Override(StateName),
}

/// A hook fed the current state tag and the shared turn context.
pub type HookFn = Arc<dyn Fn(&str, &mut TurnContext) -> HookDecision + Send + Sync>;

/// Shape an oracle answer must conform to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerShape {
    Boolean,
    Text,
    /// A string drawn from a closed set (e.g. the participant roster).
    OneOf(Vec<String>),
}

impl AnswerShape {
    /// The shape descriptor embedded in the JSON schema shown to the oracle.
    pub fn spec_string(&self) -> String {
        match self {
            AnswerShape::Boolean => "boolean".to_string(),
            AnswerShape::Text => "string".to_string(),
            AnswerShape::OneOf(options) => {
                format!("string (select from: {})", options.join(", "))
            }
        }
    }

    /// Check a parsed answer value against this shape.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            AnswerShape::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected a boolean, got {value}"))
                }
            }
            // Null is tolerated for free text; it normalizes to "".
            AnswerShape::Text => {
                if value.is_string() || value.is_null() {
                    Ok(())
                } else {
                    Err(format!("expected a string, got {value}"))
                }
            }
            AnswerShape::OneOf(options) => match value.as_str() {
                Some(s) if options.iter().any(|o| o == s) => Ok(()),
                Some(s) => Err(format!(
                    "'{s}' is not one of the accepted values ({})",
                    options.join(", ")
                )),
                None => Err(format!("expected a string, got {value}")),
            },
        }
    }
}

/// One named question the policy asks the oracle every turn.
#[derive(Clone)]
pub struct Criterion {
    /// Unique key within a criteria list; doubles as the JSON object key in
    /// the oracle's expected answer shape.
    pub name: String,

    /// The question text, rendered as one bullet point in the step prompt.
    pub prompt: String,

    /// Expected answer shape.
    pub shape: AnswerShape,

    /// Runs before next-step execution; may force an early transition.
    pub pre_hook: Option<HookFn>,

    /// Runs after next-step execution; may force an early transition.
    pub post_hook: Option<HookFn>,
}

impl Criterion {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, shape: AnswerShape) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            shape,
            pre_hook: None,
            post_hook: None,
        }
    }

    pub fn with_pre_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &mut TurnContext) -> HookDecision + Send + Sync + 'static,
    {
        self.pre_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_post_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &mut TurnContext) -> HookDecision + Send + Sync + 'static,
    {
        self.post_hook = Some(Arc::new(hook));
        self
    }

    /// The bullet-point line for the step prompt.
    pub fn bullet_point(&self) -> String {
        format!("    - {}", self.prompt)
    }

    /// The JSON-schema fragment for this criterion's slot in the answer.
    pub fn schema_fragment(&self) -> String {
        format!(
            "    \"{}\": {{\n        \"reason\": string,\n        \"answer\": {}\n    }}",
            self.name,
            self.shape.spec_string()
        )
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("pre_hook", &self.pre_hook.is_some())
            .field("post_hook", &self.post_hook.is_some())
            .finish()
    }
}

/// One criterion's slot in the structured answer.
#[derive(Debug, Clone, Deserialize)]
pub struct CriterionAnswer {
    /// Free-text reasoning accompanying the answer.
    #[serde(default)]
    pub reason: String,

    /// The typed answer; shape-checked against the criterion's declaration.
    pub answer: Value,
}

/// The oracle's structured answer for one turn, keyed by criterion name.
#[derive(Debug, Clone, Default)]
pub struct NextStep {
    answers: HashMap<String, CriterionAnswer>,
}

impl NextStep {
    pub fn new(answers: HashMap<String, CriterionAnswer>) -> Self {
        Self { answers }
    }

    /// Validate a raw oracle reply against the declared criteria list.
    ///
    /// Every criterion must be present with a conforming answer; anything
    /// less is an [`OrchestrationError::OracleParse`], which the owning
    /// transition converts into a round restart.
    pub fn parse(raw: &Value, criteria: &[Criterion]) -> OrchestrationResult<Self> {
        let object = raw.as_object().ok_or_else(|| {
            OrchestrationError::OracleParse(format!("top-level answer is not a JSON object: {raw}"))
        })?;

        let mut answers = HashMap::with_capacity(criteria.len());
        for criterion in criteria {
            let slot = object.get(&criterion.name).ok_or_else(|| {
                OrchestrationError::OracleParse(format!(
                    "answer is missing criterion '{}'",
                    criterion.name
                ))
            })?;
            let answer: CriterionAnswer =
                serde_json::from_value(slot.clone()).map_err(|e| {
                    OrchestrationError::OracleParse(format!(
                        "criterion '{}' is malformed: {e}",
                        criterion.name
                    ))
                })?;
            criterion.shape.validate(&answer.answer).map_err(|e| {
                OrchestrationError::OracleParse(format!("criterion '{}': {e}", criterion.name))
            })?;
            answers.insert(criterion.name.clone(), answer);
        }
        Ok(Self { answers })
    }

    pub fn answer(&self, name: &str) -> Option<&CriterionAnswer> {
        self.answers.get(name)
    }

    /// The boolean answer for a criterion, if present and boolean.
    pub fn bool_answer(&self, name: &str) -> Option<bool> {
        self.answers.get(name)?.answer.as_bool()
    }

    /// The text answer for a criterion. A JSON `null` normalizes to "".
    pub fn text_answer(&self, name: &str) -> Option<&str> {
        match &self.answers.get(name)?.answer {
            Value::String(s) => Some(s),
            Value::Null => Some(""),
            _ => None,
        }
    }
}
