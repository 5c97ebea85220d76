//! Hierarchical: a manager delegates to workers, then synthesizes their
//! results. Malformed delegation JSON falls back to handing every worker the
//! original task.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

/// Parses the manager's delegation reply into a `{worker_name: task}` map.
/// Workers absent from the block are dropped silently; any worker the
/// manager didn't mention (or any parse failure) falls back to the original
/// task for that worker.
fn resolve_assignments(delegation_reply: &str, worker_names: &[String], fallback_task: &str) -> HashMap<String, String> {
    let mut assignments: HashMap<String, String> = worker_names
        .iter()
        .map(|name| (name.clone(), fallback_task.to_string()))
        .collect();

    let Ok(parsed) = serde_json::from_str::<Value>(delegation_reply) else {
        return assignments;
    };
    let Some(subtasks) = parsed.get("subtasks").and_then(Value::as_array) else {
        return assignments;
    };

    for item in subtasks {
        let worker = item.get("worker").and_then(Value::as_str);
        let task = item.get("task").and_then(Value::as_str);
        if let (Some(worker), Some(task)) = (worker, task) {
            if assignments.contains_key(worker) {
                assignments.insert(worker.to_string(), task.to_string());
            }
            // Worker named by the manager isn't in this block: dropped.
        }
    }
    assignments
}

pub async fn run_hierarchical(
    ctx: &PatternCtx<'_>,
    manager: &mut Agent,
    workers: &mut [Agent],
    task: &str,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    let mut durations_ms = HashMap::new();

    ctx.emit_status(&manager.name, AgentState::Delegating);
    let delegation_prompt = format!(
        "{task}\n\nRespond with a JSON object of the form {{\"subtasks\": [{{\"worker\": <name>, \"task\": <string>}}]}} assigning work to your workers."
    );
    let manager_name = manager.name.clone();
    let sink = make_sink(ctx.bus, &manager_name, streaming);
    let start = Timer::now();
    let delegation = ctx
        .runtime
        .send(manager, ctx.user_id, &delegation_prompt, None, &sink)
        .await?;
    let delegation_ms = elapsed_ms(start);
    ctx.emit_status(&manager.name, AgentState::Completed { duration_ms: delegation_ms });
    durations_ms.insert(format!("{}:delegation", manager.name), delegation_ms);

    let worker_names: Vec<String> = workers.iter().map(|w| w.name.clone()).collect();
    let assignments = resolve_assignments(&delegation.final_text, &worker_names, task);

    let mut agent_outputs = HashMap::new();
    for worker in workers.iter_mut() {
        let assigned_task = assignments
            .get(&worker.name)
            .cloned()
            .unwrap_or_else(|| task.to_string());
        ctx.emit_status(&worker.name, AgentState::Executing);
        let worker_name = worker.name.clone();
        let sink = make_sink(ctx.bus, &worker_name, streaming);
        let start = Timer::now();
        let outcome = ctx
            .runtime
            .send(worker, ctx.user_id, &assigned_task, None, &sink)
            .await?;
        let duration_ms = elapsed_ms(start);
        ctx.emit_status(&worker.name, AgentState::Completed { duration_ms });
        agent_outputs.insert(worker.name.clone(), outcome.final_text);
        durations_ms.insert(worker.name.clone(), duration_ms);
    }

    ctx.emit_status(&manager.name, AgentState::Synthesizing);
    let worker_results_json = serde_json::to_string_pretty(&agent_outputs).map_err(|e| OrchestraError::ParseError {
        what: "worker_results".into(),
        message: e.to_string(),
    })?;
    let synthesis_prompt = format!("{task}\n\nWorker results:\n{worker_results_json}\n\nSynthesize a final result.");
    let manager_name = manager.name.clone();
    let sink = make_sink(ctx.bus, &manager_name, streaming);
    let start = Timer::now();
    let synthesis = ctx
        .runtime
        .send(manager, ctx.user_id, &synthesis_prompt, None, &sink)
        .await?;
    let synthesis_ms = elapsed_ms(start);
    ctx.emit_status(&manager.name, AgentState::Completed { duration_ms: synthesis_ms });
    durations_ms.insert(format!("{}:synthesis", manager.name), synthesis_ms);

    Ok(PatternOutcome {
        pattern: "hierarchical".into(),
        final_result: Value::String(synthesis.final_text),
        extra: serde_json::json!({ "worker_results": agent_outputs }),
        agent_outputs,
        durations_ms,
    })
}
