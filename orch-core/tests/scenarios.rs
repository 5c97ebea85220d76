//! End-to-end scenarios driving `GraphExecutor` against scripted providers.

use std::collections::HashMap;
use std::sync::Arc;

use orch_core::agent::AgentRole;
use orch_core::credentials::EnvCredentialStore;
use orch_core::design::{AgentSpec, Block, BlockData, Connection, Design, EndpointRef};
use orch_core::eventbus::RunEventBus;
use orch_core::graph::GraphExecutor;
use orch_core::log::RunStatus;
use orch_core::provider::{EchoLlmClient, MockLlmClient};
use orch_core::runtime::AgentRuntime;
use orch_core::workspace_iface::UnconfiguredWorkspaceAcquirer;
use orch_core::log::InMemoryExecutionLogStore;
use serde_json::{json, Value};

fn agent_spec(id: &str, name: &str, system_prompt: &str, role: AgentRole) -> AgentSpec {
    AgentSpec {
        id: id.to_string(),
        name: name.to_string(),
        system_prompt: system_prompt.to_string(),
        role,
    }
}

fn block(id: &str, pattern: &str, agents: Vec<AgentSpec>, task: &str) -> Block {
    Block {
        id: id.to_string(),
        block_type: pattern.to_string(),
        position: Value::Null,
        data: BlockData {
            label: id.to_string(),
            agents,
            task: task.to_string(),
            git_repo: None,
            rounds: None,
            isolate_agent_workspaces: false,
        },
    }
}

fn connection(source: &str, target: &str) -> Connection {
    Connection {
        id: None,
        source: EndpointRef::Bare(source.to_string()),
        target: EndpointRef::Bare(target.to_string()),
    }
}

fn executor_with(client: Arc<MockLlmClient>) -> GraphExecutor {
    let creds = Arc::new(EnvCredentialStore::with_process_key(HashMap::new(), Some("k".into())));
    let runtime = AgentRuntime::new(creds, client);
    GraphExecutor::new(runtime, Arc::new(UnconfiguredWorkspaceAcquirer), Arc::new(InMemoryExecutionLogStore::new()))
}

#[tokio::test]
async fn scenario_a_sequential_pipeline_two_agents() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply("You are Extractor", "logins=1000");
    client.set_reply("You are Analyzer", "healthy");
    let executor = executor_with(client);

    let design = Design {
        id: Some("design-a".into()),
        name: "seq".into(),
        description: None,
        blocks: vec![block(
            "B1",
            "sequential",
            vec![
                agent_spec("a1", "Extractor", "You are Extractor", AgentRole::Worker),
                agent_spec("a2", "Analyzer", "You are Analyzer", AgentRole::Worker),
            ],
            "",
        )],
        connections: vec![],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor
        .execute(&design, Value::String("Analyze: logins=1000".into()), None, &bus)
        .await
        .unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    assert_eq!(log.final_result, Some(Value::String("healthy".into())));
}

#[tokio::test]
async fn scenario_b_parallel_with_aggregator() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply("You are A", "a");
    client.set_reply("You are B", "b");
    client.set_reply("You are C", "c");
    client.set_reply("You are Agg", "a+b+c");
    let executor = executor_with(client);

    let design = Design {
        id: Some("design-b".into()),
        name: "par".into(),
        description: None,
        blocks: vec![block(
            "B1",
            "parallel",
            vec![
                agent_spec("a", "A", "You are A", AgentRole::Worker),
                agent_spec("b", "B", "You are B", AgentRole::Worker),
                agent_spec("c", "C", "You are C", AgentRole::Worker),
                agent_spec("agg", "Agg", "You are Agg", AgentRole::Moderator),
            ],
            "",
        )],
        connections: vec![],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor.execute(&design, Value::String("go".into()), None, &bus).await.unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    assert_eq!(log.final_result, Some(Value::String("a+b+c".into())));
    let record = &log.results["B1"];
    assert_eq!(record["agent_outputs"]["A"], "a");
    assert_eq!(record["agent_outputs"]["B"], "b");
    assert_eq!(record["agent_outputs"]["C"], "c");
}

#[tokio::test]
async fn scenario_c_hierarchical_with_malformed_delegation() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply("You are Manager", "not json");
    client.set_reply("You are W1", "r1");
    client.set_reply("You are W2", "r2");
    let executor = executor_with(client);

    let design = Design {
        id: Some("design-c".into()),
        name: "hier".into(),
        description: None,
        blocks: vec![block(
            "B1",
            "hierarchical",
            vec![
                agent_spec("m", "Manager", "You are Manager", AgentRole::Manager),
                agent_spec("w1", "W1", "You are W1", AgentRole::Worker),
                agent_spec("w2", "W2", "You are W2", AgentRole::Worker),
            ],
            "do the work",
        )],
        connections: vec![],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor
        .execute(&design, Value::String("do the work".into()), None, &bus)
        .await
        .unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    let record = &log.results["B1"];
    assert_eq!(record["agent_outputs"]["W1"], "r1");
    assert_eq!(record["agent_outputs"]["W2"], "r2");
    // The manager's reply is scripted identically for both its delegation and
    // synthesis calls, so the final result is whatever that single script says.
    assert_eq!(log.final_result, Some(Value::String("not json".into())));
}

#[tokio::test]
async fn scenario_d_debate_two_agents_two_rounds() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply("You are Pro", "pro-says");
    client.set_reply("You are Con", "con-says");
    let executor = executor_with(client);

    let design = Design {
        id: Some("design-d".into()),
        name: "debate".into(),
        description: None,
        blocks: vec![Block {
            id: "B1".into(),
            block_type: "debate".into(),
            position: Value::Null,
            data: BlockData {
                label: "B1".into(),
                agents: vec![
                    agent_spec("pro", "Pro", "You are Pro", AgentRole::Worker),
                    agent_spec("con", "Con", "You are Con", AgentRole::Worker),
                ],
                task: "".into(),
                git_repo: None,
                rounds: Some(2),
                isolate_agent_workspaces: false,
            },
        }],
        connections: vec![],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor.execute(&design, Value::String("X".into()), None, &bus).await.unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    let Some(Value::Array(utterances)) = log.final_result else {
        panic!("expected the debate's final result to be an array of utterances");
    };
    assert_eq!(utterances.len(), 4);
    let rounds: Vec<u64> = utterances.iter().map(|u| u["round"].as_u64().unwrap()).collect();
    assert_eq!(rounds, vec![1, 1, 2, 2]);
    let agents: Vec<&str> = utterances.iter().map(|u| u["agent"].as_str().unwrap()).collect();
    assert_eq!(agents, vec!["Pro", "Con", "Pro", "Con"]);
}

#[tokio::test]
async fn scenario_e_dynamic_routing_with_fenced_json() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply(
        "You are Router",
        "```json\n{\"selected_agents\":[\"S2\"],\"reasoning\":\"fits best\"}\n```",
    );
    client.set_reply("You are S1", "s1-out");
    client.set_reply("You are S2", "s2-out");
    let executor = executor_with(client);

    let design = Design {
        id: Some("design-e".into()),
        name: "routing".into(),
        description: None,
        blocks: vec![block(
            "B1",
            "routing",
            vec![
                agent_spec("router", "Router", "You are Router", AgentRole::Manager),
                agent_spec("s1", "S1", "You are S1", AgentRole::Specialist),
                agent_spec("s2", "S2", "You are S2", AgentRole::Specialist),
            ],
            "",
        )],
        connections: vec![],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor.execute(&design, Value::String("task".into()), None, &bus).await.unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    let record = &log.results["B1"];
    assert_eq!(record["extra"]["selected_agents"], json!(["S2"]));
    assert!(record["agent_outputs"].get("S1").is_none());
    assert_eq!(record["agent_outputs"]["S2"], "s2-out");
}

#[tokio::test]
async fn scenario_f_graph_dag_with_two_predecessors() {
    let client = Arc::new(MockLlmClient::new(""));
    client.set_reply("You are B1Agent", "x");
    client.set_reply("You are B2Agent", "y");
    let creds = Arc::new(EnvCredentialStore::with_process_key(HashMap::new(), Some("k".into())));
    let runtime = AgentRuntime::new(creds, Arc::new(EchoClientOrMock::new(client)));
    let executor = GraphExecutor::new(
        runtime,
        Arc::new(UnconfiguredWorkspaceAcquirer),
        Arc::new(InMemoryExecutionLogStore::new()),
    );

    let design = Design {
        id: Some("design-f".into()),
        name: "dag".into(),
        description: None,
        blocks: vec![
            block("B1", "sequential", vec![agent_spec("b1a", "B1Agent", "You are B1Agent", AgentRole::Worker)], ""),
            block("B2", "sequential", vec![agent_spec("b2a", "B2Agent", "You are B2Agent", AgentRole::Worker)], ""),
            block("B3", "sequential", vec![agent_spec("b3a", "B3Agent", "You are B3Agent", AgentRole::Worker)], ""),
        ],
        connections: vec![connection("B1", "B3"), connection("B2", "B3")],
    };

    let (bus, _rx) = RunEventBus::new(64);
    let log = executor.execute(&design, Value::Null, None, &bus).await.unwrap();

    assert_eq!(log.status, RunStatus::Completed);
    assert_eq!(log.final_result, Some(Value::String("x\n\n---\n\ny".into())));
}

/// Routes to the echo client for B3Agent (so its output equals its literal
/// input) while keeping the scripted mock for B1/B2's fixed outputs.
struct EchoClientOrMock {
    mock: Arc<MockLlmClient>,
    echo: EchoLlmClient,
}

impl EchoClientOrMock {
    fn new(mock: Arc<MockLlmClient>) -> Self {
        Self { mock, echo: EchoLlmClient }
    }
}

#[async_trait::async_trait]
impl orch_core::provider::LlmClient for EchoClientOrMock {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools_enabled: bool,
    ) -> Result<orch_core::provider::LlmResponse, orch_core::OrchestraError> {
        if system_prompt.contains("You are B3Agent") {
            self.echo.complete(system_prompt, user_message, tools_enabled).await
        } else {
            self.mock.complete(system_prompt, user_message, tools_enabled).await
        }
    }
}
