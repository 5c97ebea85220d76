//! Reflection: a sequential pipeline whose agents additionally see a JSON
//! dump of every prior block's result in the graph, so they can reflect on
//! work done elsewhere in the run rather than just the immediately previous
//! agent.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

pub async fn run_reflection(
    ctx: &PatternCtx<'_>,
    agents: &mut [Agent],
    task: &str,
    design_context: &Value,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    let design_context_json = serde_json::to_string_pretty(design_context).map_err(|e| OrchestraError::ParseError {
        what: "design_context".into(),
        message: e.to_string(),
    })?;

    let mut agent_outputs = HashMap::new();
    let mut durations_ms = HashMap::new();
    let mut prior: Option<(String, String)> = None;
    let mut final_text = String::new();

    for agent in agents.iter_mut() {
        ctx.emit_status(&agent.name, AgentState::Executing);
        let mut context = format!("Prior block results: {design_context_json}");
        if let Some((name, text)) = &prior {
            context.push_str(&format!("\n\nOutput from {name}: {text}"));
        }
        let agent_name = agent.name.clone();
        let sink = make_sink(ctx.bus, &agent_name, streaming);
        let start = Timer::now();
        let outcome = ctx
            .runtime
            .send(agent, ctx.user_id, task, Some(&context), &sink)
            .await?;
        let duration_ms = elapsed_ms(start);
        ctx.emit_status(&agent.name, AgentState::Completed { duration_ms });

        agent_outputs.insert(agent.name.clone(), outcome.final_text.clone());
        durations_ms.insert(agent.name.clone(), duration_ms);
        final_text = outcome.final_text.clone();
        prior = Some((agent.name.clone(), outcome.final_text));
    }

    Ok(PatternOutcome {
        pattern: "reflection".into(),
        agent_outputs,
        final_result: Value::String(final_text),
        durations_ms,
        extra: Value::Null,
    })
}
