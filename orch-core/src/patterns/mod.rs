//! Pattern executors: five coordination strategies plus the reflection
//! variant, all built on top of `AgentRuntime::send`.
//!
//! Every executor takes a `stream` flag: when false, chunk (and tool-call)
//! events are swallowed but status transitions and the final result are
//! unchanged, matching the "non-streaming form" every pattern must offer.

pub mod debate;
pub mod hierarchical;
pub mod parallel;
pub mod reflection;
pub mod routing;
pub mod sequential;

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use orch_protocol::event::AgentState;
use orch_protocol::Event;
use serde_json::Value;

use crate::eventbus::RunEventBus;
use crate::provider::ProviderEvent;
use crate::runtime::AgentRuntime;

pub use debate::run_debate;
pub use hierarchical::run_hierarchical;
pub use parallel::run_parallel;
pub use reflection::run_reflection;
pub use routing::run_routing;
pub use sequential::run_sequential;

/// What a pattern executor hands back to the graph executor.
#[derive(Debug, Clone)]
pub struct PatternOutcome {
    pub pattern: String,
    pub agent_outputs: HashMap<String, String>,
    pub final_result: Value,
    pub durations_ms: HashMap<String, u64>,
    /// Pattern-specific payload: debate utterances, routing selection, etc.
    pub extra: Value,
}

pub fn now_ts() -> String {
    Utc::now().to_rfc3339()
}

/// Shared collaborators every pattern executor needs: the runtime to speak
/// through, the run's event bus, and which user's credentials to resolve.
pub struct PatternCtx<'a> {
    pub runtime: &'a AgentRuntime,
    pub bus: &'a RunEventBus,
    pub user_id: Option<&'a str>,
}

impl<'a> PatternCtx<'a> {
    pub fn emit_status(&self, agent: &str, state: AgentState) {
        self.bus.push(Event::Status {
            agent: agent.to_string(),
            state,
            timestamp: now_ts(),
        });
    }
}

/// Builds the provider event sink for one agent call. When `streaming` is
/// false the sink is a no-op, which is how non-streaming pattern forms
/// discard chunk/tool-call traffic while keeping status events intact.
pub fn make_sink<'a>(bus: &'a RunEventBus, agent: &'a str, streaming: bool) -> impl Fn(ProviderEvent) + Send + Sync + 'a {
    move |event| {
        if !streaming {
            return;
        }
        match event {
            ProviderEvent::Chunk(data) => bus.push(Event::Chunk {
                agent: agent.to_string(),
                data,
                timestamp: now_ts(),
            }),
            ProviderEvent::ToolCall { name, input } => {
                let data = serde_json::json!({ "tool_call": { "name": name, "input": input } }).to_string();
                bus.push(Event::Chunk {
                    agent: agent.to_string(),
                    data,
                    timestamp: now_ts(),
                });
            }
        }
    }
}

/// Timer that reports elapsed milliseconds; kept as a type alias so pattern
/// modules don't each import `std::time::Instant` directly.
pub type Timer = Instant;

pub(crate) fn elapsed_ms(start: Timer) -> u64 {
    start.elapsed().as_millis() as u64
}
