//! Dynamic routing: a router picks which specialists should run, then
//! they execute in declared order.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

/// Strips a leading/trailing ```` ```json ```` or ```` ``` ```` fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the router's reply into a selected-agent list. Falls back to the
/// first declared specialist when parsing fails or the selection is empty.
fn resolve_selection(router_reply: &str, specialist_names: &[String]) -> (Vec<String>, Option<String>) {
    let stripped = strip_code_fence(router_reply);
    if let Ok(parsed) = serde_json::from_str::<Value>(stripped) {
        let reasoning = parsed.get("reasoning").and_then(Value::as_str).map(str::to_string);
        if let Some(selected) = parsed.get("selected_agents").and_then(Value::as_array) {
            let names: Vec<String> = selected
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| specialist_names.iter().any(|s| s == name))
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                return (names, reasoning);
            }
        }
    }
    let fallback = specialist_names.first().cloned().into_iter().collect();
    (fallback, None)
}

pub async fn run_routing(
    ctx: &PatternCtx<'_>,
    router: &mut Agent,
    specialists: &mut [Agent],
    task: &str,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    let mut durations_ms = HashMap::new();
    let specialist_names: Vec<String> = specialists.iter().map(|a| a.name.clone()).collect();

    ctx.emit_status(&router.name, AgentState::Routing);
    let routing_prompt = format!(
        "{task}\n\nAvailable specialists: {}.\nRespond with a JSON object of the form {{\"selected_agents\": [<name>], \"reasoning\": <string>}}.",
        specialist_names.join(", ")
    );
    let router_name = router.name.clone();
    let sink = make_sink(ctx.bus, &router_name, streaming);
    let start = Timer::now();
    let routing = ctx
        .runtime
        .send(router, ctx.user_id, &routing_prompt, None, &sink)
        .await?;
    let routing_ms = elapsed_ms(start);
    ctx.emit_status(&router.name, AgentState::RoutingComplete { duration_ms: routing_ms });
    durations_ms.insert(router.name.clone(), routing_ms);

    let (selected, reasoning) = resolve_selection(&routing.final_text, &specialist_names);

    let mut agent_outputs = HashMap::new();
    let mut final_result = Value::Null;
    for specialist in specialists.iter_mut() {
        if !selected.iter().any(|name| name == &specialist.name) {
            continue;
        }
        ctx.emit_status(&specialist.name, AgentState::Executing);
        let specialist_name = specialist.name.clone();
        let sink = make_sink(ctx.bus, &specialist_name, streaming);
        let start = Timer::now();
        let outcome = ctx.runtime.send(specialist, ctx.user_id, task, None, &sink).await?;
        let duration_ms = elapsed_ms(start);
        ctx.emit_status(&specialist.name, AgentState::Completed { duration_ms });
        durations_ms.insert(specialist.name.clone(), duration_ms);
        final_result = Value::String(outcome.final_text.clone());
        agent_outputs.insert(specialist.name.clone(), outcome.final_text);
    }

    Ok(PatternOutcome {
        pattern: "routing".into(),
        agent_outputs,
        final_result,
        durations_ms,
        extra: serde_json::json!({ "selected_agents": selected, "reasoning": reasoning }),
    })
}
