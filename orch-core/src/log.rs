//! The durable execution log: one record per graph run, updated
//! incrementally as blocks complete so a poller sees progress without
//! subscribing to the event stream.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{truncate_error, OrchestraError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Endpoint,
    Scheduled,
}

/// One run's durable record. `status` only moves `Running -> Completed` or
/// `Running -> Failed`; it never reverses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: String,
    pub design_id: Option<String>,
    pub status: RunStatus,
    pub trigger_type: TriggerType,
    pub input: Value,
    /// Per-block results recorded as each block completes.
    pub results: HashMap<String, Value>,
    pub final_result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl ExecutionLog {
    pub fn start(id: impl Into<String>, design_id: Option<String>, trigger_type: TriggerType, input: Value) -> Self {
        Self {
            id: id.into(),
            design_id,
            status: RunStatus::Running,
            trigger_type,
            input,
            results: HashMap::new(),
            final_result: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn record_block_result(&mut self, block_id: impl Into<String>, result: Value) {
        self.results.insert(block_id.into(), result);
    }

    pub fn complete(&mut self, final_result: Value) {
        self.status = RunStatus::Completed;
        self.final_result = Some(final_result);
        self.finish();
    }

    pub fn fail(&mut self, error: &OrchestraError) {
        self.status = RunStatus::Failed;
        self.error = Some(truncate_error(&error.to_string()));
        self.finish();
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds().max(0) as u64);
    }
}

#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    async fn create(&self, log: ExecutionLog) -> Result<(), OrchestraError>;
    async fn update(&self, log: ExecutionLog) -> Result<(), OrchestraError>;
    async fn get(&self, id: &str) -> Result<Option<ExecutionLog>, OrchestraError>;
}

/// Reference implementation. Persistent storage is an external collaborator;
/// this backs tests and any embedder that hasn't wired in a real store yet.
#[derive(Default)]
pub struct InMemoryExecutionLogStore {
    logs: DashMap<String, ExecutionLog>,
}

impl InMemoryExecutionLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionLogStore for InMemoryExecutionLogStore {
    async fn create(&self, log: ExecutionLog) -> Result<(), OrchestraError> {
        self.logs.insert(log.id.clone(), log);
        Ok(())
    }

    async fn update(&self, log: ExecutionLog) -> Result<(), OrchestraError> {
        self.logs.insert(log.id.clone(), log);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ExecutionLog>, OrchestraError> {
        Ok(self.logs.get(id).map(|entry| entry.value().clone()))
    }
}

pub type SharedExecutionLogStore = Arc<dyn ExecutionLogStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_preserves_per_block_results() {
        let store = InMemoryExecutionLogStore::new();
        let mut log = ExecutionLog::start("run-1", Some("design-1".into()), TriggerType::Manual, Value::Null);
        log.record_block_result("B1", Value::String("x".into()));
        log.record_block_result("B2", Value::String("y".into()));
        store.create(log.clone()).await.unwrap();

        let reloaded = store.get("run-1").await.unwrap().unwrap();
        assert_eq!(reloaded.results, log.results);
    }

    #[test]
    fn fail_truncates_long_error_messages() {
        let mut log = ExecutionLog::start("run-2", None, TriggerType::Manual, Value::Null);
        let long_message = "x".repeat(10_000);
        log.fail(&OrchestraError::Workspace(long_message));
        assert_eq!(log.status, RunStatus::Failed);
        assert!(log.error.unwrap().len() < 10_000);
    }
}
