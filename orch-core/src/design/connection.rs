//! Connections: directed edges between blocks.

use serde::{Deserialize, Serialize};

/// A connection's endpoint may be a bare block id or an object naming an
/// agent within a block. The core only schedules at block granularity, so
/// the detailed form collapses to its block id for every purpose here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointRef {
    Bare(String),
    Detailed {
        #[serde(rename = "blockId")]
        block_id: String,
        #[serde(rename = "agentId", default)]
        agent_id: Option<String>,
    },
}

impl EndpointRef {
    pub fn block_id(&self) -> &str {
        match self {
            EndpointRef::Bare(id) => id,
            EndpointRef::Detailed { block_id, .. } => block_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub id: Option<String>,
    pub source: EndpointRef,
    pub target: EndpointRef,
}
