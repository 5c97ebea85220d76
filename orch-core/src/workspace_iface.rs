//! The graph executor's view of workspace materialization. The concrete
//! git-clone implementation lives in the separate `orch-workspace` crate,
//! which depends on this trait rather than the other way around, so the
//! core stays ignorant of git/SSH/filesystem specifics.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::design::Block;
use crate::error::OrchestraError;

/// What a block's workspace acquisition produced, in the shape the
/// `workspace_info` event and agent system prompts need.
#[derive(Debug, Clone)]
pub struct WorkspaceHandle {
    pub execution_id: String,
    pub parent_dir: String,
    /// Present only in isolated mode: agent name -> relative subdirectory.
    pub agent_mapping: Option<HashMap<String, String>>,
    pub workspace_ids: Option<Vec<String>>,
}

#[async_trait]
pub trait WorkspaceAcquirer: Send + Sync {
    /// Materializes whatever filesystem a block's `git_repo` and
    /// `isolate_agent_workspaces` settings call for. Called once per block
    /// that declares a source repository; blocks without one never call this.
    async fn acquire(&self, execution_id: &str, block: &Block) -> Result<WorkspaceHandle, OrchestraError>;

    /// Removes one workspace's directory from disk and marks its record
    /// archived. Never called automatically by the graph executor; cleanup
    /// is an explicit call from whoever owns the workspace's lifetime.
    async fn cleanup(&self, workspace_id: &str) -> Result<(), OrchestraError>;

    /// Removes every workspace directory belonging to a run in one call.
    async fn cleanup_execution(&self, execution_id: &str) -> Result<(), OrchestraError>;
}

/// Used when no `WorkspaceAcquirer` has been wired in; any block requesting
/// a repo-backed workspace fails clearly instead of silently no-op'ing.
pub struct UnconfiguredWorkspaceAcquirer;

#[async_trait]
impl WorkspaceAcquirer for UnconfiguredWorkspaceAcquirer {
    async fn acquire(&self, _execution_id: &str, block: &Block) -> Result<WorkspaceHandle, OrchestraError> {
        Err(OrchestraError::Workspace(format!(
            "block '{}' declares a git_repo but no workspace acquirer is configured",
            block.id
        )))
    }

    async fn cleanup(&self, _workspace_id: &str) -> Result<(), OrchestraError> {
        Ok(())
    }

    async fn cleanup_execution(&self, _execution_id: &str) -> Result<(), OrchestraError> {
        Ok(())
    }
}
