//! The default orchestration flow as a [`StateGraph`].
//!
//! One pass of this graph is one "round": derive facts and a plan, then loop
//! obtain-step / execute-step until a hook or the turn budget forces an exit.
//! Every pass ends in a final state; the outer control loop decides whether
//! another round begins.

use std::sync::Arc;

use futures::FutureExt;

use crate::domain::errors::OrchestrationError;
use crate::domain::models::config::OrchestratorConfig;
use crate::domain::models::context::TurnContext;
use crate::domain::models::state_graph::{Action, StateGraph, Transition};
use crate::services::criteria::{self, HookPhase};
use crate::services::orchestrator::OrchestratorCore;
use crate::services::prompts;

/// State tags of the default flow.
pub mod states {
    pub const INIT: &str = "init";
    pub const OBTAIN_NEXTSTEP: &str = "obtain_nextstep";
    pub const PRE_EXECUTION_NEXTSTEP: &str = "pre_execution_nextstep";
    pub const EXECUTE_NEXTSTEP: &str = "execute_nextstep";
    pub const POST_EXECUTION_NEXTSTEP: &str = "post_execution_nextstep";
    pub const INTROSPECT_AND_RESET: &str = "introspect_and_reset";
    pub const RESET: &str = "reset";
    pub const TERMINATE_TRUE: &str = "terminate_true";
    pub const END: &str = "end";
}

/// Build the default flow over a shared core.
///
/// The turn-budget guard sits at the head of the `obtain_nextstep` decision:
/// once a turn is admitted, its obtain/execute cycle always completes, so a
/// pass can only end in `reset`, `terminate_true`, or `end`.
pub fn default_flow(core: Arc<OrchestratorCore>, config: &OrchestratorConfig) -> StateGraph {
    let max_turns = config.max_turns;

    let analyze_facts = {
        let core = Arc::clone(&core);
        Action::function(move |ctx: &mut TurnContext| {
            let core = Arc::clone(&core);
            async move {
                let prompt = prompts::closed_book(&ctx.task);
                let facts = core.think_and_respond(&mut ctx.conversation, &prompt).await?;
                ctx.memory.facts = facts;
                Ok(None)
            }
            .boxed()
        })
    };

    let make_initial_plan = {
        let core = Arc::clone(&core);
        Action::function(move |ctx: &mut TurnContext| {
            let core = Arc::clone(&core);
            async move {
                let prompt = prompts::initial_plan(&ctx.team);
                let plan = core.think_and_respond(&mut ctx.conversation, &prompt).await?;
                ctx.memory.plan = plan;
                Ok(None)
            }
            .boxed()
        })
    };

    let obtain_decision = {
        let core = Arc::clone(&core);
        Transition::decide(move |ctx: &mut TurnContext| {
            let core = Arc::clone(&core);
            async move {
                if ctx.total_turns >= max_turns {
                    tracing::info!(turns = ctx.total_turns, "turn budget reached; closing the round");
                    return Ok(states::RESET.to_string());
                }
                ctx.total_turns += 1;
                match core.think_next_step(ctx).await {
                    Ok(step) => {
                        ctx.next_step = Some(step);
                        Ok(states::PRE_EXECUTION_NEXTSTEP.to_string())
                    }
                    Err(OrchestrationError::OracleParse(reason)) => {
                        tracing::warn!(%reason, turn = ctx.total_turns, "malformed step answer; restarting the round");
                        Ok(states::RESET.to_string())
                    }
                    Err(other) => Err(other),
                }
            }
            .boxed()
        })
    };

    let execute_step = {
        let core = Arc::clone(&core);
        Action::function(move |ctx: &mut TurnContext| {
            let core = Arc::clone(&core);
            async move {
                let step = ctx.next_step.as_ref().ok_or_else(|| {
                    OrchestrationError::Internal(
                        "reached execution without a next-step answer".to_string(),
                    )
                })?;
                let instruction = step
                    .text_answer(criteria::INSTRUCTION_OR_QUESTION)
                    .unwrap_or("")
                    .to_string();
                let speaker = step
                    .text_answer(criteria::NEXT_SPEAKER)
                    .unwrap_or("")
                    .to_string();
                core.broadcast_and_collect(ctx, &instruction, &speaker).await?;
                Ok(None)
            }
            .boxed()
        })
    };

    let introspect = {
        let core = Arc::clone(&core);
        Action::function(move |ctx: &mut TurnContext| {
            let core = Arc::clone(&core);
            async move {
                core.rethink_facts_and_plan(ctx).await?;
                Ok(None)
            }
            .boxed()
        })
    };

    StateGraph::builder()
        .initial(states::INIT)
        .terminal(states::END)
        .max_transitions(config.max_transitions)
        .state(states::INIT, vec![analyze_facts, make_initial_plan])
        .transition(states::INIT, Transition::to(states::OBTAIN_NEXTSTEP))
        .state(states::OBTAIN_NEXTSTEP, vec![])
        .transition(states::OBTAIN_NEXTSTEP, obtain_decision)
        .state(states::PRE_EXECUTION_NEXTSTEP, vec![])
        .transition(
            states::PRE_EXECUTION_NEXTSTEP,
            Transition::decide(|ctx: &mut TurnContext| {
                let next = criteria::run_hook_chain(
                    HookPhase::Pre,
                    states::PRE_EXECUTION_NEXTSTEP,
                    states::EXECUTE_NEXTSTEP,
                    ctx,
                );
                async move { Ok(next) }.boxed()
            }),
        )
        .state(states::EXECUTE_NEXTSTEP, vec![execute_step])
        .transition(
            states::EXECUTE_NEXTSTEP,
            Transition::to(states::POST_EXECUTION_NEXTSTEP),
        )
        .state(states::POST_EXECUTION_NEXTSTEP, vec![])
        .transition(
            states::POST_EXECUTION_NEXTSTEP,
            Transition::decide(|ctx: &mut TurnContext| {
                let next = criteria::run_hook_chain(
                    HookPhase::Post,
                    states::POST_EXECUTION_NEXTSTEP,
                    states::OBTAIN_NEXTSTEP,
                    ctx,
                );
                async move { Ok(next) }.boxed()
            }),
        )
        .state(states::INTROSPECT_AND_RESET, vec![introspect])
        .transition(states::INTROSPECT_AND_RESET, Transition::to(states::RESET))
        .state(states::RESET, vec![])
        .transition(states::RESET, Transition::to(states::END))
        .state(states::TERMINATE_TRUE, vec![])
        .transition(states::TERMINATE_TRUE, Transition::to(states::END))
        .state(states::END, vec![])
        .transition(states::END, Transition::to(states::END))
        .build()
}
