//! The orchestration controller.
//!
//! [`OrchestratorCore`] is the shared half: the oracle handle, the
//! participant roster, and the conversational primitives the flow's actions
//! and transitions call into. It sits behind an `Arc` so the state graph's
//! closures can capture it. [`Orchestrator`] is the owning half: it holds the
//! graph, the engine, and the config, and drives the outer round loop.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::config::OrchestratorConfig;
use crate::domain::models::context::TurnContext;
use crate::domain::models::criterion::{Criterion, NextStep};
use crate::domain::models::message::Message;
use crate::domain::models::report::{RunReport, Termination};
use crate::domain::models::state_graph::StateGraph;
use crate::domain::ports::oracle::Oracle;
use crate::domain::ports::participant::Participant;
use crate::services::criteria::{self, default_criteria};
use crate::services::engine::{StateGraphEngine, TraceEntry};
use crate::services::flow::{self, default_flow};
use crate::services::prompts;

/// Oracle and roster handles shared with the flow's closures.
pub struct OrchestratorCore {
    name: String,
    oracle: Arc<dyn Oracle>,
    participants: Vec<Arc<dyn Participant>>,
    timeout: Option<Duration>,
}

impl OrchestratorCore {
    pub fn new(
        name: impl Into<String>,
        oracle: Arc<dyn Oracle>,
        participants: Vec<Arc<dyn Participant>>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            oracle,
            participants,
            timeout,
        }
    }

    /// Speaker name the controller signs its own messages with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participants(&self) -> &[Arc<dyn Participant>] {
        &self.participants
    }

    fn participant(&self, name: &str) -> Option<&Arc<dyn Participant>> {
        self.participants.iter().find(|p| p.name() == name)
    }

    async fn oracle_respond(&self, messages: &[Message]) -> OrchestrationResult<String> {
        match self.timeout {
            Some(limit) => Ok(tokio::time::timeout(limit, self.oracle.respond(messages))
                .await
                .map_err(|_| {
                    OrchestrationError::OracleUnavailable(format!(
                        "oracle call timed out after {}ms",
                        limit.as_millis()
                    ))
                })??),
            None => Ok(self.oracle.respond(messages).await?),
        }
    }

    async fn oracle_respond_structured(
        &self,
        messages: &[Message],
        schema_hint: &str,
    ) -> OrchestrationResult<serde_json::Value> {
        match self.timeout {
            Some(limit) => Ok(tokio::time::timeout(
                limit,
                self.oracle.respond_structured(messages, schema_hint),
            )
            .await
            .map_err(|_| {
                OrchestrationError::OracleUnavailable(format!(
                    "oracle call timed out after {}ms",
                    limit.as_millis()
                ))
            })??),
            None => Ok(self.oracle.respond_structured(messages, schema_hint).await?),
        }
    }

    /// Pose a free-text prompt against a transcript and append both the
    /// prompt and the oracle's reply to it.
    pub async fn think_and_respond(
        &self,
        log: &mut Vec<Message>,
        prompt: &str,
    ) -> OrchestrationResult<String> {
        log.push(Message::user(prompt).with_name(self.name.clone()));
        let reply = self.oracle_respond(log).await?;
        log.push(Message::assistant(reply.clone()).with_name(self.name.clone()));
        Ok(reply)
    }

    /// Ask the whole criteria battery in one structured request and validate
    /// the answer. The step prompt itself is not logged; it is rebuilt from
    /// the same templates every turn.
    pub async fn think_next_step(&self, ctx: &TurnContext) -> OrchestrationResult<NextStep> {
        let prompt = prompts::next_step(&ctx.task, &ctx.team, &ctx.criteria);
        let schema = prompts::next_step_schema(&ctx.criteria);
        let mut messages = ctx.memory.snapshot();
        messages.push(Message::user(prompt).with_name(self.name.clone()));
        let raw = self.oracle_respond_structured(&messages, &schema).await?;
        let step = NextStep::parse(&raw, &ctx.criteria)?;
        tracing::debug!(turn = ctx.total_turns, "obtained next-step answer");
        Ok(step)
    }

    /// Rewrite the fact sheet and the plan from the orchestrated log.
    ///
    /// The facts exchange is logged as conversational turns; the plan reply
    /// is metadata and deliberately stays out of the log.
    pub async fn rethink_facts_and_plan(&self, ctx: &mut TurnContext) -> OrchestrationResult<()> {
        tracing::info!(
            stalled = ctx.stalled_count,
            "no forward progress; rewriting facts and plan"
        );

        let facts_prompt = prompts::rethink_facts(&ctx.memory.facts);
        ctx.memory
            .append(Message::user(facts_prompt).with_name(self.name.clone()));
        let facts = self.oracle_respond(&ctx.memory.snapshot()).await?;
        ctx.memory
            .append(Message::assistant(facts.clone()).with_name(self.name.clone()));
        ctx.memory.facts = facts;

        let plan_prompt = prompts::new_plan(&ctx.team);
        ctx.memory
            .append(Message::user(plan_prompt).with_name(self.name.clone()));
        let plan = self.oracle_respond(&ctx.memory.snapshot()).await?;
        ctx.memory.plan = plan;
        Ok(())
    }

    /// Deliver a message to every participant, forcing the user role so each
    /// recipient files it as incoming. `aloud_to` marks the one out-loud
    /// delivery; `exclude` skips a recipient entirely.
    pub async fn broadcast(
        &self,
        message: &Message,
        aloud_to: Option<&str>,
        exclude: Option<&str>,
    ) -> OrchestrationResult<()> {
        let mut delivered = message.clone();
        delivered.role = crate::domain::models::message::Role::User;
        for participant in &self.participants {
            if Some(participant.name()) == exclude {
                continue;
            }
            let out_loud = Some(participant.name()) == aloud_to;
            participant
                .receive(&delivered, out_loud)
                .await
                .map_err(|e| OrchestrationError::Participant {
                    name: participant.name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// One execution turn: announce the instruction, solicit exactly one
    /// reply from the chosen speaker, and fan the reply out.
    ///
    /// Ordering is announce, record, solicit, record reply, fan out.
    pub async fn broadcast_and_collect(
        &self,
        ctx: &mut TurnContext,
        instruction: &str,
        speaker: &str,
    ) -> OrchestrationResult<()> {
        let participant = self
            .participant(speaker)
            .ok_or_else(|| OrchestrationError::Participant {
                name: speaker.to_string(),
                reason: "not in the roster".to_string(),
            })?;

        let announce = Message::user(instruction).with_name(self.name.clone());
        self.broadcast(&announce, Some(speaker), None).await?;
        ctx.memory
            .append(Message::assistant(instruction).with_name(self.name.clone()));

        let history = ctx.memory.snapshot();
        let reply = participant
            .act(&history)
            .await
            .map_err(|e| OrchestrationError::Participant {
                name: speaker.to_string(),
                reason: e.to_string(),
            })?;
        let speaker_name = reply.name.clone().unwrap_or_else(|| speaker.to_string());
        let logged = Message::user(reply.content).with_name(speaker_name);
        ctx.memory.append(logged.clone());

        // The speaker hears its own reply back so its private history stays
        // consistent with everyone else's.
        participant
            .receive(&logged, false)
            .await
            .map_err(|e| OrchestrationError::Participant {
                name: speaker.to_string(),
                reason: e.to_string(),
            })?;
        self.broadcast(&logged, None, Some(speaker)).await?;

        tracing::debug!(speaker = %speaker, turn = ctx.total_turns, "collected reply");
        Ok(())
    }
}

/// Top-level driver: owns the flow, the engine, and the round loop.
pub struct Orchestrator {
    session_id: Uuid,
    core: Arc<OrchestratorCore>,
    graph: StateGraph,
    engine: StateGraphEngine,
    criteria: Vec<Criterion>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        participants: Vec<Arc<dyn Participant>>,
        config: OrchestratorConfig,
    ) -> Self {
        let names: Vec<String> = participants.iter().map(|p| p.name().to_string()).collect();
        let criteria = default_criteria(&names, config.stall_threshold);
        let core = Arc::new(OrchestratorCore::new(
            config.name.clone(),
            oracle,
            participants,
            config.oracle_timeout,
        ));
        let graph = default_flow(Arc::clone(&core), &config);
        Self {
            session_id: Uuid::new_v4(),
            core,
            graph,
            engine: StateGraphEngine::new(),
            criteria,
            config,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Executed states across every pass of this run, in order.
    pub fn state_history(&self) -> &[TraceEntry] {
        self.engine.history()
    }

    /// Drive the team at the task until the oracle judges it satisfied or
    /// the turn budget runs out.
    pub async fn run(&mut self, task: impl Into<String>) -> OrchestrationResult<RunReport> {
        self.graph.validate()?;
        criteria::validate_criteria(&self.criteria)?;
        if self.core.participants().is_empty() {
            return Err(OrchestrationError::InvalidSetup(
                "participant roster is empty".to_string(),
            ));
        }

        let team = self
            .core
            .participants()
            .iter()
            .map(|p| format!("{}: {}", p.name(), p.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let names: Vec<String> = self
            .core
            .participants()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let mut ctx = TurnContext::new(task, team, names, self.criteria.clone());

        let mut rounds = 0u32;
        tracing::info!(
            session = %self.session_id,
            max_turns = self.config.max_turns,
            "starting orchestration run"
        );

        while ctx.total_turns < self.config.max_turns {
            rounds += 1;
            ctx.memory.begin_round();
            for participant in self.core.participants() {
                participant.reset_memory().await;
            }

            let briefing = Message::assistant(prompts::team_briefing(
                &ctx.task,
                &ctx.team,
                &ctx.memory.facts,
                &ctx.memory.plan,
            ))
            .with_name(self.core.name().to_string());
            ctx.memory.append(briefing.clone());
            self.core.broadcast(&briefing, None, None).await?;
            tracing::info!(
                session = %self.session_id,
                round = rounds,
                turns = ctx.total_turns,
                "starting round"
            );

            let mut state = self.graph.initial_state().to_string();
            let mut transitions = 0u32;
            while !self.graph.is_final(&state) {
                if transitions >= self.graph.max_transitions() {
                    tracing::warn!(
                        session = %self.session_id,
                        state = %state,
                        "transition budget exhausted; closing the round"
                    );
                    break;
                }
                let next = self.engine.run_state(&self.graph, &state, &mut ctx).await?;
                transitions += 1;
                if next == flow::states::TERMINATE_TRUE {
                    tracing::info!(
                        session = %self.session_id,
                        turns = ctx.total_turns,
                        rounds,
                        "request satisfied"
                    );
                    return Ok(RunReport::new(Termination::Satisfied, &ctx, rounds));
                }
                state = next;
            }
        }

        tracing::info!(
            session = %self.session_id,
            turns = ctx.total_turns,
            rounds,
            "turn budget exhausted before satisfaction"
        );
        Ok(RunReport::new(Termination::BudgetExhausted, &ctx, rounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::message::Role;
    use crate::domain::ports::oracle::OracleError;
    use crate::services::test_stubs::{step_value, ScriptedOracle, StubParticipant};
    use async_trait::async_trait;

    fn core_with(
        oracle: ScriptedOracle,
    ) -> (
        Arc<OrchestratorCore>,
        Arc<StubParticipant>,
        Arc<StubParticipant>,
    ) {
        let alice = Arc::new(
            StubParticipant::new("alice", "does things").with_replies(vec!["on it"]),
        );
        let bob = Arc::new(StubParticipant::new("bob", "watches"));
        let core = Arc::new(OrchestratorCore::new(
            "orchestrator",
            Arc::new(oracle),
            vec![alice.clone() as Arc<dyn Participant>, bob.clone()],
            None,
        ));
        (core, alice, bob)
    }

    fn ctx() -> TurnContext {
        TurnContext::new(
            "task",
            "alice: does things\nbob: watches",
            vec!["alice".to_string(), "bob".to_string()],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_think_and_respond_appends_prompt_and_reply() {
        let (core, _, _) = core_with(ScriptedOracle::default().with_free(vec!["the answer"]));
        let mut log = Vec::new();
        let reply = core.think_and_respond(&mut log, "the question").await.unwrap();

        assert_eq!(reply, "the answer");
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[0].content, "the question");
        assert_eq!(log[1].role, Role::Assistant);
        assert_eq!(log[1].content, "the answer");
        assert_eq!(log[1].name.as_deref(), Some("orchestrator"));
    }

    #[tokio::test]
    async fn test_rethink_logs_facts_exchange_but_not_plan_reply() {
        let (core, _, _) =
            core_with(ScriptedOracle::default().with_free(vec!["new facts", "new plan"]));
        let mut ctx = ctx();
        ctx.memory.facts = "old facts".to_string();

        core.rethink_facts_and_plan(&mut ctx).await.unwrap();

        assert_eq!(ctx.memory.facts, "new facts");
        assert_eq!(ctx.memory.plan, "new plan");
        // facts prompt, facts reply, plan prompt; no plan reply.
        assert_eq!(ctx.memory.len(), 3);
        let transcript = ctx.memory.transcript();
        assert_eq!(transcript[1].content, "new facts");
        assert_eq!(transcript[2].role, Role::User);
        assert!(transcript[2].content.contains("new plan expressed in bullet points"));
    }

    #[tokio::test]
    async fn test_broadcast_and_collect_orders_announce_record_solicit_fanout() {
        let (core, alice, bob) = core_with(ScriptedOracle::default());
        let mut ctx = ctx();

        core.broadcast_and_collect(&mut ctx, "check the logs", "alice")
            .await
            .unwrap();

        let transcript = ctx.memory.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert_eq!(transcript[0].content, "check the logs");
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[1].name.as_deref(), Some("alice"));

        assert_eq!(alice.acts(), 1);
        assert_eq!(bob.acts(), 0);
        let alice_inbox = alice.inbox();
        assert_eq!(alice_inbox.len(), 2);
        assert!(alice_inbox[0].1);
        assert!(!alice_inbox[1].1);
        let bob_inbox = bob.inbox();
        assert_eq!(bob_inbox.len(), 2);
        assert_eq!(bob_inbox[0].0.content, "check the logs");
        assert!(!bob_inbox[0].1);
        assert_eq!(bob_inbox[1].0.role, Role::User);
    }

    #[tokio::test]
    async fn test_unknown_speaker_is_a_participant_error() {
        let (core, _, _) = core_with(ScriptedOracle::default());
        let mut ctx = ctx();
        let err = core
            .broadcast_and_collect(&mut ctx, "hi", "mallory")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Participant { .. }));
    }

    struct SilentOracle;

    #[async_trait]
    impl Oracle for SilentOracle {
        async fn respond(&self, _messages: &[Message]) -> Result<String, OracleError> {
            futures::future::pending().await
        }

        async fn respond_structured(
            &self,
            _messages: &[Message],
            _schema_hint: &str,
        ) -> Result<serde_json::Value, OracleError> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_timeout_surfaces_as_unavailable() {
        let alice = Arc::new(StubParticipant::new("alice", "does things"));
        let config = OrchestratorConfig::default().with_oracle_timeout(Duration::from_secs(5));
        let mut orchestrator =
            Orchestrator::new(Arc::new(SilentOracle), vec![alice as Arc<dyn Participant>], config);

        let err = orchestrator.run("anyone there?").await.unwrap_err();
        assert!(matches!(err, OrchestrationError::OracleUnavailable(_)));
    }

    #[tokio::test]
    async fn test_run_reports_satisfied_on_first_turn() {
        let oracle = ScriptedOracle::default()
            .with_structured(vec![step_value(true, true, "alice", "nothing left")]);
        let alice = Arc::new(StubParticipant::new("alice", "does things"));
        let mut orchestrator = Orchestrator::new(
            Arc::new(oracle),
            vec![alice.clone() as Arc<dyn Participant>],
            OrchestratorConfig::default(),
        );

        let report = orchestrator.run("finish the task").await.unwrap();
        assert!(report.is_satisfied());
        assert_eq!(report.verdict(), Some("TERMINATE"));
        assert_eq!(report.turns_used, 1);
        assert_eq!(report.rounds, 1);
        // The satisfied short-circuit fires before any execution.
        assert_eq!(alice.acts(), 0);
    }

    #[tokio::test]
    async fn test_run_rejects_empty_roster() {
        let mut orchestrator = Orchestrator::new(
            Arc::new(ScriptedOracle::default()),
            vec![],
            OrchestratorConfig::default(),
        );
        let err = orchestrator.run("task").await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidSetup(_)));
    }
}
