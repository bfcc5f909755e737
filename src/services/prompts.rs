//! Prompt assembly for the default orchestration flow.
//!
//! Opaque string-producing functions parameterized by task, team, facts, and
//! plan. The criteria battery contributes one bullet point and one
//! JSON-schema fragment per criterion, in list order, so the assembled step
//! prompt is stable and reproducible for a given criteria list.

use crate::domain::models::criterion::Criterion;

/// Closed-book pre-survey that derives the initial fact sheet from the task.
pub fn closed_book(task: &str) -> String {
    format!(
        r#"Below I will present you a request. Before we begin addressing the request, please answer the following pre-survey to the best of your ability. Keep in mind that you are Ken Jennings-level with trivia, and Mensa-level with puzzles, so there should be a deep well to draw from.

Here is the request:

{task}

Here is the pre-survey:

    1. Please list any specific facts or figures that are GIVEN in the request itself. It is possible that there are none.
    2. Please list any facts that may need to be looked up, and WHERE SPECIFICALLY they might be found. In some cases, authoritative sources are mentioned in the request itself.
    3. Please list any facts that may need to be derived (e.g., via logical deduction, simulation, or computation)
    4. Please list any facts that are recalled from memory, hunches, well-reasoned guesses, etc.

When answering this survey, keep in mind that "facts" will typically be specific names, dates, statistics, etc. Your answer should use headings:

    1. GIVEN OR VERIFIED FACTS
    2. FACTS TO LOOK UP
    3. FACTS TO DERIVE
    4. EDUCATED GUESSES"#
    )
    .trim()
    .to_string()
}

/// Initial bullet-point plan, constrained to the assembled team.
pub fn initial_plan(team: &str) -> String {
    format!(
        r#"Fantastic. To address this request we have assembled the following team:

{team}

Based on the team composition, and known and unknown facts, please devise a short bullet-point plan for addressing the original request. Remember, there is no requirement to involve all team members -- a team member's particular expertise may not be needed for this task."#
    )
    .trim()
    .to_string()
}

/// The per-turn step prompt asking every criterion at once.
pub fn next_step(task: &str, team: &str, criteria: &[Criterion]) -> String {
    let bullet_points = criteria
        .iter()
        .map(Criterion::bullet_point)
        .collect::<Vec<_>>()
        .join("\n");
    let json_schema = next_step_schema(criteria);

    format!(
        r#"Recall we are working on the following request:

{task}

And we have assembled the following team:

{team}

To make progress on the request, please answer the following questions, including necessary reasoning:

{bullet_points}

Please output an answer in pure JSON format according to the following schema. The JSON object must be parsable as-is. DO NOT OUTPUT ANYTHING OTHER THAN JSON, AND DO NOT DEVIATE FROM THIS SCHEMA:

{json_schema}"#
    )
    .trim()
    .to_string()
}

/// The JSON schema shown to the oracle, keyed by criterion name in list
/// order.
pub fn next_step_schema(criteria: &[Criterion]) -> String {
    let inner = criteria
        .iter()
        .map(Criterion::schema_fragment)
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{inner}\n}}")
}

/// Round-opening briefing rebuilt from the latest facts and plan.
pub fn team_briefing(task: &str, team: &str, facts: &str, plan: &str) -> String {
    format!(
        r#"We are working to address the following user request:

{task}


To answer this request we have assembled the following team:

{team}

Some additional points to consider:

{facts}

{plan}"#
    )
    .trim()
    .to_string()
}

/// Fact-sheet rewrite issued when the team has stalled.
pub fn rethink_facts(prev_facts: &str) -> String {
    format!(
        r#"It's clear we aren't making as much progress as we would like, but we may have learned something new. Please rewrite the following fact sheet, updating it to include anything new we have learned. This is also a good time to update educated guesses (please add or update at least one educated guess or hunch, and explain your reasoning).

{prev_facts}"#
    )
    .trim()
    .to_string()
}

/// Fresh plan request, constrained to the given roster.
pub fn new_plan(team: &str) -> String {
    format!(
        r#"Please come up with a new plan expressed in bullet points. Keep in mind the following team composition, and do not involve any other outside people in the plan -- we cannot contact anyone else.

Team membership:
{team}"#
    )
    .trim()
    .to_string()
}
