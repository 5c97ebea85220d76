//! Sequential pipeline: each agent hands its output to the next as context.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

/// Runs `agents` in order against `task`. The first agent sees the task
/// alone; every later agent sees the prior agent's output wrapped as context
/// naming who produced it. The pipeline's final result is the last agent's
/// output.
pub async fn run_sequential(
    ctx: &PatternCtx<'_>,
    agents: &mut [Agent],
    task: &str,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    let mut agent_outputs = HashMap::new();
    let mut durations_ms = HashMap::new();
    let mut prior: Option<(String, String)> = None; // (agent name, output)
    let mut final_text = String::new();

    for agent in agents.iter_mut() {
        ctx.emit_status(&agent.name, AgentState::Executing);
        let context = prior
            .as_ref()
            .map(|(name, text)| format!("Output from {name}: {text}"));
        let agent_name = agent.name.clone();
        let sink = make_sink(ctx.bus, &agent_name, streaming);
        let start = Timer::now();
        let outcome = ctx
            .runtime
            .send(agent, ctx.user_id, task, context.as_deref(), &sink)
            .await?;
        let duration_ms = elapsed_ms(start);
        ctx.emit_status(&agent.name, AgentState::Completed { duration_ms });

        agent_outputs.insert(agent.name.clone(), outcome.final_text.clone());
        durations_ms.insert(agent.name.clone(), duration_ms);
        final_text = outcome.final_text.clone();
        prior = Some((agent.name.clone(), outcome.final_text));
    }

    Ok(PatternOutcome {
        pattern: "sequential".into(),
        agent_outputs,
        final_result: Value::String(final_text),
        durations_ms,
        extra: Value::Null,
    })
}
