//! Runs a full design: validates it, computes a topological order, and
//! drives each block's pattern executor with its predecessors' outputs
//! concatenated as input.

use std::collections::HashMap;
use std::sync::Arc;

use orch_protocol::Event;
use serde_json::Value;
use uuid::Uuid;

use crate::agent::{Agent, AgentRole};
use crate::design::{validate_design, Block, BlockPattern, Design};
use crate::error::OrchestraError;
use crate::eventbus::RunEventBus;
use crate::log::{ExecutionLog, SharedExecutionLogStore, TriggerType};
use crate::patterns::{
    run_debate, run_hierarchical, run_parallel, run_reflection, run_routing, run_sequential, PatternCtx,
    PatternOutcome,
};
use crate::runtime::AgentRuntime;
use crate::workspace_iface::WorkspaceAcquirer;

use super::topo::topological_sort;

/// Joins block outputs the way the graph's context-threading rule requires:
/// a bare string passes through, anything else is JSON-pretty-printed.
fn stringify_input(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn pattern_outcome_to_record(outcome: &PatternOutcome) -> Value {
    serde_json::json!({
        "pattern": outcome.pattern,
        "agent_outputs": outcome.agent_outputs,
        "final_result": outcome.final_result,
        "durations_ms": outcome.durations_ms,
        "extra": outcome.extra,
    })
}

pub struct GraphExecutor {
    runtime: AgentRuntime,
    workspace: Arc<dyn WorkspaceAcquirer>,
    log_store: SharedExecutionLogStore,
}

impl GraphExecutor {
    pub fn new(runtime: AgentRuntime, workspace: Arc<dyn WorkspaceAcquirer>, log_store: SharedExecutionLogStore) -> Self {
        Self {
            runtime,
            workspace,
            log_store,
        }
    }

    fn gather_block_input(&self, design: &Design, block: &Block, block_outputs: &HashMap<String, Value>, initial_input: &Value) -> String {
        let incoming = design.incoming(&block.id);
        let input_text = if incoming.is_empty() {
            stringify_input(initial_input)
        } else {
            incoming
                .iter()
                .filter_map(|c| block_outputs.get(c.source.block_id()))
                .map(stringify_input)
                .collect::<Vec<_>>()
                .join("\n\n---\n\n")
        };
        if block.data.task.trim().is_empty() {
            input_text
        } else {
            format!("{}\n\n{}", block.data.task, input_text)
        }
    }

    async fn run_block(
        &self,
        block: &Block,
        input: &str,
        user_id: Option<&str>,
        bus: &RunEventBus,
        prior_block_outputs: &HashMap<String, Value>,
    ) -> Result<PatternOutcome, OrchestraError> {
        let mut agents: Vec<Agent> = block
            .data
            .agents
            .iter()
            .map(|spec| Agent::new(spec.name.clone(), spec.role, spec.system_prompt.clone()))
            .collect();
        let ctx = PatternCtx {
            runtime: &self.runtime,
            bus,
            user_id,
        };

        let pattern = block
            .pattern()
            .expect("block pattern was validated before execution");

        match pattern {
            BlockPattern::Sequential => run_sequential(&ctx, &mut agents, input, true).await,
            BlockPattern::Parallel => {
                let aggregator_idx = agents.iter().position(|a| a.role == AgentRole::Moderator);
                let mut aggregator = aggregator_idx.map(|idx| agents.remove(idx));
                run_parallel(&ctx, &mut agents, aggregator.as_mut(), input, true).await
            }
            BlockPattern::Hierarchical => {
                let manager_idx = agents.iter().position(|a| a.role == AgentRole::Manager).unwrap_or(0);
                let mut manager = agents.remove(manager_idx);
                run_hierarchical(&ctx, &mut manager, &mut agents, input, true).await
            }
            BlockPattern::Debate => {
                let rounds = block.data.rounds.unwrap_or(1);
                run_debate(&ctx, &mut agents, input, rounds, true).await
            }
            BlockPattern::Routing => {
                let router_idx = agents.iter().position(|a| a.role == AgentRole::Manager).unwrap_or(0);
                let mut router = agents.remove(router_idx);
                run_routing(&ctx, &mut router, &mut agents, input, true).await
            }
            BlockPattern::Reflection => {
                let design_context = serde_json::to_value(prior_block_outputs).unwrap_or(Value::Null);
                run_reflection(&ctx, &mut agents, input, &design_context, true).await
            }
        }
    }

    /// Validates, then executes, `design` against `input`, streaming events
    /// onto `bus` and writing incremental progress to the log store.
    pub async fn execute(&self, design: &Design, input: Value, user_id: Option<&str>, bus: &RunEventBus) -> Result<ExecutionLog, OrchestraError> {
        validate_design(design)?;

        let execution_id = Uuid::new_v4().to_string();
        tracing::info!(execution_id = %execution_id, design = %design.name, "starting graph execution");
        let mut log = ExecutionLog::start(execution_id.clone(), design.id.clone(), TriggerType::Manual, input.clone());
        self.log_store.create(log.clone()).await?;

        let node_ids: Vec<String> = design.blocks.iter().map(|b| b.id.clone()).collect();
        let edges: Vec<(String, String)> = design
            .connections
            .iter()
            .map(|c| (c.source.block_id().to_string(), c.target.block_id().to_string()))
            .collect();
        let order = topological_sort(&node_ids, &edges)?;

        let all_agent_names: Vec<String> = design
            .blocks
            .iter()
            .flat_map(|b| b.data.agents.iter().map(|a| a.name.clone()))
            .collect();
        bus.push(Event::Start {
            pattern: "graph".into(),
            agents: all_agent_names,
        });

        let mut block_outputs: HashMap<String, Value> = HashMap::new();

        for block_id in &order {
            let block = design.block(block_id).expect("topological order only names known blocks");

            if block.data.git_repo.is_some() {
                if let Err(err) = self.materialize_workspace(&execution_id, block, bus).await {
                    return self.fail_run(&mut log, err, bus).await;
                }
            }

            let input_for_block = self.gather_block_input(design, block, &block_outputs, &input);
            tracing::debug!(block_id = %block.id, pattern = ?block.pattern(), "running block");
            match self.run_block(block, &input_for_block, user_id, bus, &block_outputs).await {
                Ok(outcome) => {
                    let record = pattern_outcome_to_record(&outcome);
                    log.record_block_result(block.id.clone(), record);
                    self.log_store.update(log.clone()).await?;
                    block_outputs.insert(block.id.clone(), outcome.final_result);
                }
                Err(err) => {
                    tracing::error!(block_id = %block.id, error = %err, "block failed");
                    return self.fail_run(&mut log, err, bus).await;
                }
            }
        }

        let final_result = order.last().and_then(|id| block_outputs.get(id)).cloned().unwrap_or(Value::Null);
        log.complete(final_result.clone());
        self.log_store.update(log.clone()).await?;
        tracing::info!(execution_id = %execution_id, duration_ms = log.duration_ms.unwrap_or(0), "graph execution complete");
        bus.push(Event::Complete {
            pattern: "graph".into(),
            result: final_result,
            duration_ms: log.duration_ms.unwrap_or(0),
        });

        Ok(log)
    }

    async fn materialize_workspace(&self, execution_id: &str, block: &Block, bus: &RunEventBus) -> Result<(), OrchestraError> {
        let handle = self.workspace.acquire(execution_id, block).await?;
        if block.data.isolate_agent_workspaces {
            bus.push(Event::WorkspaceInfo {
                execution_id: handle.execution_id,
                parent_dir: handle.parent_dir,
                agent_mapping: serde_json::to_value(&handle.agent_mapping).unwrap_or(Value::Null),
                workspace_ids: handle.workspace_ids.map(|ids| serde_json::to_value(ids).unwrap_or(Value::Null)),
            });
        }
        Ok(())
    }

    async fn fail_run(&self, log: &mut ExecutionLog, err: OrchestraError, bus: &RunEventBus) -> Result<ExecutionLog, OrchestraError> {
        log.fail(&err);
        let _ = self.log_store.update(log.clone()).await;
        bus.push(Event::Error { error: err.to_string() });
        Err(err)
    }

    /// Removes one workspace's directory and archives its record. `execute`
    /// never calls this itself — a run's workspaces persist past the run so a
    /// caller can inspect them before deciding to clean up.
    pub async fn cleanup_workspace(&self, workspace_id: &str) -> Result<(), OrchestraError> {
        self.workspace.cleanup(workspace_id).await
    }

    /// Removes every workspace directory created for a run and archives
    /// their records.
    pub async fn cleanup_workspaces_for_execution(&self, execution_id: &str) -> Result<(), OrchestraError> {
        self.workspace.cleanup_execution(execution_id).await
    }
}
