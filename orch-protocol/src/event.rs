//! Protocol-level event types for the run event-subscription interface.
//!
//! `result` / `data` payloads use `serde_json::Value` so this crate stays
//! independent of orch-core's result types; orch-core serializes into it.

use serde::Serialize;
use serde_json::Value;

/// Status of one agent within a block, as reported on the event stream.
///
/// `Completed` and `RoutingComplete` carry the call's wall-clock duration so
/// subscribers can render per-agent timing without a second round trip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AgentState {
    Waiting,
    Executing,
    Routing,
    Delegating,
    Synthesizing,
    Aggregating,
    Completed { duration_ms: u64 },
    RoutingComplete { duration_ms: u64 },
}

/// One item on a run's event stream. Every run emits `start`, then any mix of
/// `status` / `chunk` / `workspace_info`, then exactly one `complete` or `error`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted exactly once per run, before any block executes.
    Start { pattern: String, agents: Vec<String> },
    /// Emitted once per isolated-workspace block, right after workspace creation.
    WorkspaceInfo {
        execution_id: String,
        parent_dir: String,
        agent_mapping: Value,
        workspace_ids: Option<Value>,
    },
    /// Per-agent lifecycle transition within a block.
    Status {
        agent: String,
        #[serde(flatten)]
        state: AgentState,
        timestamp: String,
    },
    /// Partial text output from one agent's provider call.
    Chunk {
        agent: String,
        data: String,
        timestamp: String,
    },
    /// Terminal: the run (or, when emitted mid-run by an executor, the block) finished successfully.
    Complete {
        pattern: String,
        result: Value,
        duration_ms: u64,
    },
    /// Terminal alternative to `Complete`.
    Error { error: String },
}

impl Event {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
