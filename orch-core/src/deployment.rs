//! The deployment entry surface: named bindings of a design to a trigger
//! (manual, endpoint path, or schedule). The core executes deployments, not
//! designs directly, whenever something external triggers a run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::design::Design;
use crate::error::OrchestraError;
use crate::eventbus::RunEventBus;
use crate::graph::GraphExecutor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub enabled: bool,
    /// Standard five-field cron expression; interpretation belongs to the
    /// scheduler collaborator, not the core.
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub design_id: String,
    pub endpoint_path: Option<String>,
    pub schedule: Option<Schedule>,
}

#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Deployment>, OrchestraError>;
    async fn get_by_endpoint(&self, path: &str) -> Result<Option<Deployment>, OrchestraError>;
    async fn get_design(&self, design_id: &str) -> Result<Option<Design>, OrchestraError>;
}

/// Periodically asked which deployments are due; the core does not schedule
/// anything itself.
pub trait Scheduler: Send + Sync {
    fn due_deployments(&self, now: DateTime<Utc>) -> Vec<Deployment>;
}

/// Returned immediately by a manual or endpoint-triggered execution, before
/// the run has necessarily finished.
#[derive(Debug, Clone, Serialize)]
pub struct RunHandle {
    pub execution_id: String,
    pub log_id: String,
    pub status_url: String,
}

/// Submits a design for asynchronous execution and hands back a handle the
/// caller can poll by `log_id`; the run itself proceeds on a spawned task.
pub fn spawn_run(
    executor: Arc<GraphExecutor>,
    design: Design,
    input: Value,
    user_id: Option<String>,
) -> (RunHandle, mpsc::Receiver<orch_protocol::Event>) {
    let execution_id = Uuid::new_v4().to_string();
    let log_id = execution_id.clone();
    let status_url = format!("/executions/{log_id}");

    let (bus, rx) = RunEventBus::new(256);

    tokio::spawn(async move {
        let _ = executor
            .execute(&design, input, user_id.as_deref(), &bus)
            .await;
    });

    (
        RunHandle {
            execution_id,
            log_id,
            status_url,
        },
        rx,
    )
}

/// Parses a raw endpoint request body as JSON input, falling back to an
/// empty object when the body isn't present or isn't JSON.
pub fn parse_endpoint_input(raw_body: Option<&str>) -> Value {
    raw_body
        .and_then(|body| serde_json::from_str(body).ok())
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}
