//! Materializes a block's declared source repository onto disk, in one of
//! three modes: no repo (project root), shared (one clone for the block), or
//! isolated (one clone per agent).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use orch_core::design::Block;
use orch_core::error::OrchestraError;
use orch_core::workspace_iface::{WorkspaceAcquirer, WorkspaceHandle};
use tokio::process::Command;
use uuid::Uuid;

use crate::error::WorkspaceError;
use crate::ssh::stage_ssh_keys;
use crate::store::{SharedWorkspaceRecordStore, Workspace, WorkspaceStatus};

/// Replaces spaces and slashes with underscores, matching the original
/// "safe-slugged" directory-name rule.
pub fn slugify_agent_name(name: &str) -> String {
    name.replace(' ', "_").replace('/', "_")
}

pub struct WorkspaceManager {
    temp_root: PathBuf,
    /// Returned as the workspace path for blocks that declare no `git_repo`.
    project_root: PathBuf,
    /// Directory holding the operator's staged SSH keys; `None` skips staging.
    ssh_keys_dir: Option<PathBuf>,
    records: SharedWorkspaceRecordStore,
}

impl WorkspaceManager {
    pub fn new(
        temp_root: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        ssh_keys_dir: Option<PathBuf>,
        records: SharedWorkspaceRecordStore,
    ) -> Self {
        Self {
            temp_root: temp_root.into(),
            project_root: project_root.into(),
            ssh_keys_dir,
            records,
        }
    }

    fn ensure_under_root(&self, path: &Path) -> Result<(), WorkspaceError> {
        if path.starts_with(&self.temp_root) {
            Ok(())
        } else {
            Err(WorkspaceError::PathEscape(path.display().to_string()))
        }
    }

    async fn run_git_clone(&self, repo: &str, dest: &Path) -> Result<(), WorkspaceError> {
        let output = Command::new("git")
            .args(["clone", "--depth", "1", repo])
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| WorkspaceError::Clone {
                repo: repo.to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(WorkspaceError::Clone {
                repo: repo.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn stage_ssh(&self, dest: &Path) -> Result<Option<String>, WorkspaceError> {
        match &self.ssh_keys_dir {
            Some(ssh_keys_dir) => stage_ssh_keys(ssh_keys_dir, dest),
            None => Ok(None),
        }
    }

    /// Points the clone at `dest` to the staged identity so a later
    /// `git push`/`git pull` from that workspace actually uses it.
    async fn configure_git_ssh(&self, dest: &Path, ssh_command: &str) -> Result<(), WorkspaceError> {
        let output = Command::new("git")
            .args(["config", "core.sshCommand", ssh_command])
            .current_dir(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(WorkspaceError::Ssh(String::from_utf8_lossy(&output.stderr).trim().to_string()))
        }
    }

    /// Clones `repo` into `dest`, stages SSH material if any is configured,
    /// and wires the clone's `core.sshCommand` to it so pushes/pulls from the
    /// workspace use the staged identity.
    async fn clone_one(&self, repo: &str, dest: &Path) -> Result<(), WorkspaceError> {
        self.run_git_clone(repo, dest).await?;
        if let Some(ssh_command) = self.stage_ssh(dest)? {
            self.configure_git_ssh(dest, &ssh_command).await?;
        }
        Ok(())
    }

    async fn record_workspace(&self, execution_id: &str, agent_name: Option<&str>, absolute_path: &Path, source_repo: &str) -> Result<String, WorkspaceError> {
        let id = Uuid::new_v4().to_string();
        self.records
            .create(Workspace {
                id: id.clone(),
                execution_id: execution_id.to_string(),
                agent_name: agent_name.map(str::to_string),
                absolute_path: absolute_path.display().to_string(),
                source_repo: Some(source_repo.to_string()),
                status: WorkspaceStatus::Active,
                created_at: Utc::now(),
                last_accessed_at: None,
            })
            .await
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Ok(id)
    }

    async fn clone_shared(&self, execution_id: &str, repo: &str) -> Result<WorkspaceHandle, WorkspaceError> {
        let dest = self.temp_root.join(format!("orchestration_block_{}", Uuid::new_v4()));
        self.ensure_under_root(&dest)?;
        tracing::debug!(execution_id = %execution_id, repo = %repo, path = %dest.display(), "cloning shared workspace");
        self.clone_one(repo, &dest).await?;
        let workspace_id = self.record_workspace(execution_id, None, &dest, repo).await?;

        Ok(WorkspaceHandle {
            execution_id: execution_id.to_string(),
            parent_dir: dest.display().to_string(),
            agent_mapping: None,
            workspace_ids: Some(vec![workspace_id]),
        })
    }

    async fn clone_isolated(&self, execution_id: &str, repo: &str, agent_names: &[String]) -> Result<WorkspaceHandle, WorkspaceError> {
        let parent = self.temp_root.join(format!("orchestration_isolated_{}", Uuid::new_v4()));
        self.ensure_under_root(&parent)?;
        tokio::fs::create_dir_all(&parent).await?;

        let mut agent_mapping = HashMap::new();
        let mut workspace_ids = Vec::new();

        for agent_name in agent_names {
            let safe_name = slugify_agent_name(agent_name);
            let subdir = parent.join(&safe_name);

            let cloned = self.clone_one(repo, &subdir).await;

            match cloned {
                Ok(()) => {
                    let workspace_id = self.record_workspace(execution_id, Some(agent_name), &subdir, repo).await?;
                    workspace_ids.push(workspace_id);
                    agent_mapping.insert(agent_name.clone(), safe_name);
                }
                Err(err) => {
                    tracing::warn!(execution_id = %execution_id, agent = %agent_name, error = %err, "isolated clone failed, removing parent directory");
                    let _ = tokio::fs::remove_dir_all(&parent).await;
                    return Err(err);
                }
            }
        }

        Ok(WorkspaceHandle {
            execution_id: execution_id.to_string(),
            parent_dir: parent.display().to_string(),
            agent_mapping: Some(agent_mapping),
            workspace_ids: Some(workspace_ids),
        })
    }

    async fn remove_workspace_dir(path: &str) -> Result<(), WorkspaceError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::Io(e.to_string())),
        }
    }

    /// Removes the workspace's directory from disk and marks its record
    /// archived. Not called automatically anywhere in this crate; a caller
    /// (the graph executor or an embedder) decides when a workspace's
    /// lifetime is over.
    pub async fn cleanup(&self, workspace_id: &str) -> Result<(), WorkspaceError> {
        let Some(workspace) = self.records.get(workspace_id).await? else {
            return Ok(());
        };
        Self::remove_workspace_dir(&workspace.absolute_path).await?;
        self.records.archive(workspace_id).await?;
        Ok(())
    }

    /// Removes every workspace directory belonging to a run and archives
    /// their records. Used to clean up an isolated block's per-agent clones
    /// in one call.
    pub async fn cleanup_execution(&self, execution_id: &str) -> Result<(), WorkspaceError> {
        let workspaces = self.records.list_for_execution(execution_id).await?;
        for workspace in &workspaces {
            Self::remove_workspace_dir(&workspace.absolute_path).await?;
        }
        self.records.archive_execution(execution_id).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkspaceAcquirer for WorkspaceManager {
    async fn acquire(&self, execution_id: &str, block: &Block) -> Result<WorkspaceHandle, OrchestraError> {
        let Some(repo) = block.data.git_repo.as_deref() else {
            return Ok(WorkspaceHandle {
                execution_id: execution_id.to_string(),
                parent_dir: self.project_root.display().to_string(),
                agent_mapping: None,
                workspace_ids: None,
            });
        };

        let agent_names: Vec<String> = block.data.agents.iter().map(|a| a.name.clone()).collect();

        let result = if block.data.isolate_agent_workspaces && !agent_names.is_empty() {
            self.clone_isolated(execution_id, repo, &agent_names).await
        } else {
            self.clone_shared(execution_id, repo).await
        };

        result.map_err(OrchestraError::from)
    }

    async fn cleanup(&self, workspace_id: &str) -> Result<(), OrchestraError> {
        WorkspaceManager::cleanup(self, workspace_id).await.map_err(OrchestraError::from)
    }

    async fn cleanup_execution(&self, execution_id: &str) -> Result<(), OrchestraError> {
        WorkspaceManager::cleanup_execution(self, execution_id).await.map_err(OrchestraError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_replaces_spaces_and_slashes() {
        assert_eq!(slugify_agent_name("Code Reviewer"), "Code_Reviewer");
        assert_eq!(slugify_agent_name("team/lead"), "team_lead");
        assert_eq!(slugify_agent_name("team/lead name"), "team_lead_name");
    }

    #[test]
    fn ensure_under_root_rejects_paths_outside_temp_root() {
        let manager = WorkspaceManager::new(
            "/tmp/orchestra-root",
            "/srv/project",
            None,
            std::sync::Arc::new(crate::store::InMemoryWorkspaceRecordStore::new()),
        );
        assert!(manager.ensure_under_root(Path::new("/tmp/orchestra-root/orchestration_block_x")).is_ok());
        assert!(manager.ensure_under_root(Path::new("/etc/passwd")).is_err());
    }
}
