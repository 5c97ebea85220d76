//! Event stream protocol for the orchestration core.
//!
//! Defines the wire shape of one event on the run's event stream. Does not
//! depend on orch-core; orch-core's graph executor and pattern executors
//! build `Event` values and push them directly onto the run's channel. Each
//! event already carries the identifiers a subscriber needs (`WorkspaceInfo`
//! carries its own `execution_id`; `Status`/`Chunk` carry the agent name), so
//! no separate envelope wrapper is applied on top.

pub mod event;

pub use event::{AgentState, Event};
