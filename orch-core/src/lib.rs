//! Orchestration core: agents, provider adapters, pattern executors, the
//! design graph and its executor.
//!
//! This crate has no transport of its own. Callers drive a run by building a
//! `Design`, handing it to `GraphExecutor`, and subscribing to the
//! `orch_protocol::Event` stream produced on the way.

pub mod agent;
pub mod config;
pub mod credentials;
pub mod deployment;
pub mod design;
pub mod error;
pub mod eventbus;
pub mod graph;
pub mod log;
pub mod message;
pub mod patterns;
pub mod provider;
pub mod runtime;
pub mod workspace_iface;

pub use agent::{Agent, AgentRole};
pub use error::OrchestraError;
pub use eventbus::RunEventBus;
pub use message::{HistoryEntry, Speaker};
