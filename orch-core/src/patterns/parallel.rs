//! Parallel aggregation: every agent runs concurrently against the same
//! task; an optional aggregator synthesizes their outputs afterward.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

pub async fn run_parallel(
    ctx: &PatternCtx<'_>,
    agents: &mut [Agent],
    aggregator: Option<&mut Agent>,
    task: &str,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    for agent in agents.iter() {
        ctx.emit_status(&agent.name, AgentState::Waiting);
    }

    let results = futures::future::join_all(agents.iter_mut().map(|agent| {
        let ctx = &*ctx;
        async move {
            ctx.emit_status(&agent.name, AgentState::Executing);
            let agent_name = agent.name.clone();
            let sink = make_sink(ctx.bus, &agent_name, streaming);
            let start = Timer::now();
            let outcome = ctx.runtime.send(agent, ctx.user_id, task, None, &sink).await;
            let duration_ms = elapsed_ms(start);
            (agent.name.clone(), outcome, duration_ms)
        }
    }))
    .await;

    let mut agent_outputs = HashMap::new();
    let mut durations_ms = HashMap::new();
    for (name, outcome, duration_ms) in results {
        let outcome = outcome?;
        ctx.emit_status(&name, AgentState::Completed { duration_ms });
        agent_outputs.insert(name.clone(), outcome.final_text);
        durations_ms.insert(name, duration_ms);
    }

    let final_result = match aggregator {
        Some(aggregator) => {
            ctx.emit_status(&aggregator.name, AgentState::Aggregating);
            let individual_results: HashMap<&String, &String> = agent_outputs.iter().collect();
            let pretty = serde_json::to_string_pretty(&individual_results)
                .map_err(|e| OrchestraError::ParseError {
                    what: "individual_results".into(),
                    message: e.to_string(),
                })?;
            let aggregator_name = aggregator.name.clone();
            let sink = make_sink(ctx.bus, &aggregator_name, streaming);
            let start = Timer::now();
            let outcome = ctx
                .runtime
                .send(aggregator, ctx.user_id, &pretty, None, &sink)
                .await?;
            let duration_ms = elapsed_ms(start);
            ctx.emit_status(&aggregator.name, AgentState::Completed { duration_ms });
            durations_ms.insert(aggregator.name.clone(), duration_ms);
            agent_outputs.insert(aggregator.name.clone(), outcome.final_text.clone());
            Value::String(outcome.final_text)
        }
        None if agent_outputs.len() == 1 => {
            Value::String(agent_outputs.values().next().cloned().unwrap_or_default())
        }
        None => serde_json::to_value(&agent_outputs).unwrap_or(Value::Null),
    };

    Ok(PatternOutcome {
        pattern: "parallel".into(),
        agent_outputs,
        final_result,
        durations_ms,
        extra: Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::credentials::EnvCredentialStore;
    use crate::eventbus::RunEventBus;
    use crate::provider::MockLlmClient;
    use crate::runtime::AgentRuntime;
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    #[tokio::test]
    async fn aggregator_runs_after_all_agents_complete() {
        let client = Arc::new(MockLlmClient::new(""));
        client.set_reply("You are A", "a");
        client.set_reply("You are B", "b");
        client.set_reply("You are C", "c");
        client.set_reply("You are Agg", "a+b+c");
        let creds = Arc::new(EnvCredentialStore::with_process_key(Map::new(), Some("k".into())));
        let runtime = AgentRuntime::new(creds, client);
        let (bus, _rx) = RunEventBus::new(64);
        let ctx = PatternCtx {
            runtime: &runtime,
            bus: &bus,
            user_id: None,
        };

        let mut agents = vec![
            Agent::new("A", AgentRole::Worker, "You are A"),
            Agent::new("B", AgentRole::Worker, "You are B"),
            Agent::new("C", AgentRole::Worker, "You are C"),
        ];
        let mut aggregator = Agent::new("Agg", AgentRole::Moderator, "You are Agg");

        let outcome = run_parallel(&ctx, &mut agents, Some(&mut aggregator), "go", true)
            .await
            .unwrap();

        assert_eq!(outcome.agent_outputs["A"], "a");
        assert_eq!(outcome.agent_outputs["B"], "b");
        assert_eq!(outcome.agent_outputs["C"], "c");
        assert_eq!(outcome.final_result, Value::String("a+b+c".into()));
    }

    #[tokio::test]
    async fn single_agent_no_aggregator_returns_its_output_directly() {
        let client = Arc::new(MockLlmClient::scripted("Solo", "solo-output"));
        let creds = Arc::new(EnvCredentialStore::with_process_key(Map::new(), Some("k".into())));
        let runtime = AgentRuntime::new(creds, client);
        let (bus, _rx) = RunEventBus::new(8);
        let ctx = PatternCtx {
            runtime: &runtime,
            bus: &bus,
            user_id: None,
        };
        let mut agents = vec![Agent::new("Solo", AgentRole::Worker, "Solo")];

        let outcome = run_parallel(&ctx, &mut agents, None, "go", false).await.unwrap();
        assert_eq!(outcome.final_result, Value::String("solo-output".into()));
    }
}
