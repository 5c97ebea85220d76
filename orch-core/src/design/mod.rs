//! The design graph: blocks, connections, and the pattern+agent shape the
//! graph executor needs to run each block.

pub mod block;
pub mod connection;
pub mod validate;

pub use block::{AgentSpec, Block, BlockData, BlockPattern};
pub use connection::{Connection, EndpointRef};
pub use validate::validate_design;

use serde::{Deserialize, Serialize};

/// A full design: the unit the graph executor consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
}

impl Design {
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Connections whose target is `block_id`.
    pub fn incoming(&self, block_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target.block_id() == block_id)
            .collect()
    }
}
