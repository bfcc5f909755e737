//! The default per-turn criteria battery and its hook policies.
//!
//! Four questions are asked every turn: is the request satisfied, is
//! progress being made, who speaks next, and what should they be told. The
//! first two carry pre-execution hooks: the termination decision (checked
//! first, so it always wins) and the debounced stall detector.

use std::collections::HashSet;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::context::TurnContext;
use crate::domain::models::criterion::{AnswerShape, Criterion, HookDecision};
use crate::domain::models::state_graph::StateName;
use crate::services::flow::states;

pub const IS_REQUEST_SATISFIED: &str = "is_request_satisfied";
pub const IS_PROGRESS_BEING_MADE: &str = "is_progress_being_made";
pub const NEXT_SPEAKER: &str = "next_speaker";
pub const INSTRUCTION_OR_QUESTION: &str = "instruction_or_question";

/// Which hook slot of each criterion a chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Pre,
    Post,
}

/// The standard criteria list for a roster of participant names.
///
/// The `next_speaker` answer shape is constrained to the roster, so an
/// out-of-roster speaker fails answer validation and restarts the round like
/// any other malformed answer.
pub fn default_criteria(names: &[String], stall_threshold: u32) -> Vec<Criterion> {
    vec![
        Criterion::new(
            IS_REQUEST_SATISFIED,
            "Is the request fully satisfied? (True if complete, or False if the original request has yet to be SUCCESSFULLY addressed)",
            AnswerShape::Boolean,
        )
        .with_pre_hook(decision_to_terminate),
        Criterion::new(
            IS_PROGRESS_BEING_MADE,
            "Are we making forward progress? (True if just starting, or recent messages are adding value. False if recent messages show evidence of being stuck in a reasoning or action loop, or there is evidence of significant barriers to success such as the inability to read from a required file)",
            AnswerShape::Boolean,
        )
        .with_pre_hook(move |state: &str, ctx: &mut TurnContext| {
            stall_update_and_check(state, ctx, stall_threshold)
        }),
        Criterion::new(
            NEXT_SPEAKER,
            format!("Who should speak next? (select from: {})", names.join(", ")),
            AnswerShape::OneOf(names.to_vec()),
        ),
        Criterion::new(
            INSTRUCTION_OR_QUESTION,
            "What instruction or question would you give this team member? (Phrase as if speaking directly to them, and include any specific information they may need)",
            AnswerShape::Text,
        ),
    ]
}

/// Criterion names must be unique: they key the oracle's answer object.
pub fn validate_criteria(criteria: &[Criterion]) -> OrchestrationResult<()> {
    let mut seen = HashSet::new();
    for criterion in criteria {
        if !seen.insert(criterion.name.as_str()) {
            return Err(OrchestrationError::InvalidSetup(format!(
                "duplicate criterion name '{}'",
                criterion.name
            )));
        }
    }
    Ok(())
}

/// Force termination the moment the oracle judges the request satisfied.
pub fn decision_to_terminate(_current: &str, ctx: &mut TurnContext) -> HookDecision {
    let satisfied = ctx
        .next_step
        .as_ref()
        .and_then(|step| step.bool_answer(IS_REQUEST_SATISFIED))
        .unwrap_or(false);
    if satisfied {
        HookDecision::Override(states::TERMINATE_TRUE.to_string())
    } else {
        HookDecision::Continue
    }
}

/// Debounced stall detector.
///
/// The counter saturates at zero on progress and increments otherwise, so
/// isolated stalls are forgiven; hitting the threshold forces introspection.
pub fn stall_update_and_check(
    _current: &str,
    ctx: &mut TurnContext,
    threshold: u32,
) -> HookDecision {
    let progress = ctx
        .next_step
        .as_ref()
        .and_then(|step| step.bool_answer(IS_PROGRESS_BEING_MADE))
        .unwrap_or(false);

    if progress {
        ctx.stalled_count = ctx.stalled_count.saturating_sub(1);
    } else {
        ctx.stalled_count += 1;
    }

    if ctx.stalled_count >= threshold {
        HookDecision::Override(states::INTROSPECT_AND_RESET.to_string())
    } else {
        HookDecision::Continue
    }
}

/// Run a hook chain over the criteria list, in declaration order.
///
/// Each hook sees the running state tag; the chain stops at the first
/// override. If nothing overrides, the default successor is returned.
pub fn run_hook_chain(
    phase: HookPhase,
    start: &str,
    default_next: &str,
    ctx: &mut TurnContext,
) -> StateName {
    let hooks: Vec<_> = ctx
        .criteria
        .iter()
        .filter_map(|criterion| {
            let hook = match phase {
                HookPhase::Pre => criterion.pre_hook.clone(),
                HookPhase::Post => criterion.post_hook.clone(),
            };
            hook.map(|h| (criterion.name.clone(), h))
        })
        .collect();

    let mut current = start.to_string();
    for (name, hook) in hooks {
        match hook(&current, ctx) {
            HookDecision::Continue => {}
            HookDecision::Override(next) => {
                tracing::debug!(criterion = %name, from = %current, to = %next, "hook forced early transition");
                current = next;
                break;
            }
        }
    }

    if current == start {
        default_next.to_string()
    } else {
        current
    }
}
