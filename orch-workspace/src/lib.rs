//! Git-backed workspace materialization: the concrete `WorkspaceAcquirer`
//! the graph executor calls into for blocks that declare a source repository.

pub mod error;
pub mod manager;
pub mod ssh;
pub mod store;

pub use error::WorkspaceError;
pub use manager::{slugify_agent_name, WorkspaceManager};
pub use store::{InMemoryWorkspaceRecordStore, SharedWorkspaceRecordStore, Workspace, WorkspaceRecordStore, WorkspaceStatus};
