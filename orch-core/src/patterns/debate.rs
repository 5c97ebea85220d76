//! Debate: a fixed agent order speaks for a fixed number of rounds. Within a
//! round, the last speaker sees every argument from that round; everyone
//! else sees only the speaker immediately before them. Between rounds the
//! context resets to a "continue the debate" prompt for the round's opener.

use std::collections::HashMap;

use orch_protocol::event::AgentState;
use serde_json::Value;

use super::{elapsed_ms, make_sink, PatternCtx, PatternOutcome, Timer};
use crate::agent::Agent;
use crate::error::OrchestraError;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Utterance {
    pub round: u32,
    pub agent: String,
    pub text: String,
    pub duration_ms: u64,
}

pub async fn run_debate(
    ctx: &PatternCtx<'_>,
    debaters: &mut [Agent],
    topic: &str,
    rounds: u32,
    streaming: bool,
) -> Result<PatternOutcome, OrchestraError> {
    let rounds = rounds.max(1);
    let mut utterances: Vec<Utterance> = Vec::new();
    let mut durations_ms = HashMap::new();
    let mut agent_outputs = HashMap::new();
    let mut round_arguments: Vec<String> = Vec::new();

    let debater_count = debaters.len();
    for round in 1..=rounds {
        round_arguments.clear();
        for (i, debater) in debaters.iter_mut().enumerate() {
            let is_first_overall = round == 1 && i == 0;
            let is_round_opener = i == 0;
            let is_last_in_round = i == debater_count - 1;

            let (message, context) = if is_first_overall {
                (format!("Initial topic: {topic}. Present your opening argument."), None)
            } else if is_round_opener {
                (
                    format!("Continue the debate on: {topic}. Build on previous arguments."),
                    None,
                )
            } else if is_last_in_round {
                (
                    format!("Respond to the debate on: {topic}."),
                    Some(round_arguments.join("\n\n---\n\n")),
                )
            } else {
                (
                    format!("Respond to the debate on: {topic}."),
                    round_arguments.last().cloned(),
                )
            };

            ctx.emit_status(&debater.name, AgentState::Executing);
            let debater_name = debater.name.clone();
            let sink = make_sink(ctx.bus, &debater_name, streaming);
            let start = Timer::now();
            let outcome = ctx
                .runtime
                .send(debater, ctx.user_id, &message, context.as_deref(), &sink)
                .await?;
            let duration_ms = elapsed_ms(start);
            ctx.emit_status(&debater.name, AgentState::Completed { duration_ms });

            round_arguments.push(outcome.final_text.clone());
            agent_outputs.insert(debater.name.clone(), outcome.final_text.clone());
            durations_ms.insert(format!("{}:round{round}", debater.name), duration_ms);
            utterances.push(Utterance {
                round,
                agent: debater.name.clone(),
                text: outcome.final_text,
                duration_ms,
            });
        }
    }

    let final_result = serde_json::to_value(&utterances).unwrap_or(Value::Null);

    Ok(PatternOutcome {
        pattern: "debate".into(),
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
    async fn two_rounds_two_agents_emits_four_utterances_in_order() {
        let client = Arc::new(MockLlmClient::new(""));
        client.set_reply("You are Pro", "pro-says");
        client.set_reply("You are Con", "con-says");
        let creds = Arc::new(EnvCredentialStore::with_process_key(Map::new(), Some("k".into())));
        let runtime = AgentRuntime::new(creds, client);
        let (bus, _rx) = RunEventBus::new(64);
        let ctx = PatternCtx {
            runtime: &runtime,
            bus: &bus,
            user_id: None,
        };

        let mut debaters = vec![
            Agent::new("Pro", AgentRole::Worker, "You are Pro"),
            Agent::new("Con", AgentRole::Worker, "You are Con"),
        ];

        let outcome = run_debate(&ctx, &mut debaters, "X", 2, false).await.unwrap();

        let Value::Array(items) = outcome.final_result else {
            panic!("expected an array of utterances");
        };
        assert_eq!(items.len(), 4);
        let rounds: Vec<u64> = items.iter().map(|u| u["round"].as_u64().unwrap()).collect();
        assert_eq!(rounds, vec![1, 1, 2, 2]);
        let agents: Vec<&str> = items.iter().map(|u| u["agent"].as_str().unwrap()).collect();
        assert_eq!(agents, vec!["Pro", "Con", "Pro", "Con"]);
    }

    #[tokio::test]
    async fn single_round_two_debaters_emits_exactly_two_utterances() {
        let client = Arc::new(MockLlmClient::new("reply"));
        let creds = Arc::new(EnvCredentialStore::with_process_key(Map::new(), Some("k".into())));
        let runtime = AgentRuntime::new(creds, client);
        let (bus, _rx) = RunEventBus::new(16);
        let ctx = PatternCtx {
            runtime: &runtime,
            bus: &bus,
            user_id: None,
        };
        let mut debaters = vec![
            Agent::new("Pro", AgentRole::Worker, "You are Pro"),
            Agent::new("Con", AgentRole::Worker, "You are Con"),
        ];
        let outcome = run_debate(&ctx, &mut debaters, "X", 1, false).await.unwrap();
        let Value::Array(items) = outcome.final_result else {
            panic!("expected an array");
        };
        assert_eq!(items.len(), 2);
    }
}
