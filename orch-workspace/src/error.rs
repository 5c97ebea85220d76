//! Workspace materialization errors. These collapse to `OrchestraError::Workspace`
//! at the `WorkspaceAcquirer` boundary so the graph executor doesn't need to
//! know about git, SSH, or filesystem layout specifics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to clone '{repo}': {message}")]
    Clone { repo: String, message: String },

    #[error("ssh key staging failed: {0}")]
    Ssh(String),

    #[error("filesystem error: {0}")]
    Io(String),

    #[error("resolved path '{0}' escapes the configured temp root")]
    PathEscape(String),
}

impl From<std::io::Error> for WorkspaceError {
    fn from(err: std::io::Error) -> Self {
        WorkspaceError::Io(err.to_string())
    }
}

impl From<WorkspaceError> for orch_core::OrchestraError {
    fn from(err: WorkspaceError) -> Self {
        orch_core::OrchestraError::Workspace(err.to_string())
    }
}
