//! Durable record of every filesystem materialization the manager has made.
//! Workspaces outlive the run that created them — cleanup is an explicit,
//! separate call, never automatic on block or run failure.
//!
//! Held in-memory rather than backed by a database: persistent storage is an
//! external collaborator here, and a `DashMap` is enough to back tests and
//! any embedder that hasn't wired in a real store yet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub execution_id: String,
    /// Nullable: absent for a shared (block-level, not per-agent) workspace.
    pub agent_name: Option<String>,
    pub absolute_path: String,
    pub source_repo: Option<String>,
    pub status: WorkspaceStatus,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait WorkspaceRecordStore: Send + Sync {
    async fn create(&self, workspace: Workspace) -> Result<(), WorkspaceError>;
    async fn get(&self, id: &str) -> Result<Option<Workspace>, WorkspaceError>;
    async fn list_for_execution(&self, execution_id: &str) -> Result<Vec<Workspace>, WorkspaceError>;
    /// Marks one workspace archived. Does not remove the directory itself —
    /// that's the caller's job once it has the record's `absolute_path`.
    async fn archive(&self, id: &str) -> Result<Option<Workspace>, WorkspaceError>;
    /// Archives every workspace belonging to a run in one call.
    async fn archive_execution(&self, execution_id: &str) -> Result<Vec<Workspace>, WorkspaceError>;
}

#[derive(Default)]
pub struct InMemoryWorkspaceRecordStore {
    workspaces: DashMap<String, Workspace>,
}

impl InMemoryWorkspaceRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkspaceRecordStore for InMemoryWorkspaceRecordStore {
    async fn create(&self, workspace: Workspace) -> Result<(), WorkspaceError> {
        self.workspaces.insert(workspace.id.clone(), workspace);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Workspace>, WorkspaceError> {
        Ok(self.workspaces.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_for_execution(&self, execution_id: &str) -> Result<Vec<Workspace>, WorkspaceError> {
        Ok(self
            .workspaces
            .iter()
            .filter(|entry| entry.value().execution_id == execution_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn archive(&self, id: &str) -> Result<Option<Workspace>, WorkspaceError> {
        Ok(self.workspaces.get_mut(id).map(|mut entry| {
            entry.status = WorkspaceStatus::Archived;
            entry.value().clone()
        }))
    }

    async fn archive_execution(&self, execution_id: &str) -> Result<Vec<Workspace>, WorkspaceError> {
        let mut archived = Vec::new();
        for mut entry in self.workspaces.iter_mut() {
            if entry.value().execution_id == execution_id {
                entry.status = WorkspaceStatus::Archived;
                archived.push(entry.value().clone());
            }
        }
        Ok(archived)
    }
}

pub type SharedWorkspaceRecordStore = Arc<dyn WorkspaceRecordStore>;
