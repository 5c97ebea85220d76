//! Block and agent-spec wire shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentRole;

/// One of the six patterns a block can run. Parsed from the wire `type`
/// string; an unrecognized string fails design validation rather than this
/// deserialization step, so invalid designs can still be reported with a
/// useful block id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPattern {
    Sequential,
    Parallel,
    Hierarchical,
    Debate,
    Routing,
    Reflection,
}

impl BlockPattern {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            "hierarchical" => Some(Self::Hierarchical),
            "debate" => Some(Self::Debate),
            "routing" => Some(Self::Routing),
            "reflection" => Some(Self::Reflection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Hierarchical => "hierarchical",
            Self::Debate => "debate",
            Self::Routing => "routing",
            Self::Reflection => "reflection",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub name: String,
    pub system_prompt: String,
    #[serde(default = "default_role")]
    pub role: AgentRole,
}

fn default_role() -> AgentRole {
    AgentRole::Worker
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    #[serde(default)]
    pub label: String,
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub git_repo: Option<String>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub isolate_agent_workspaces: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    /// Raw pattern string from the wire; validated into a `BlockPattern` by
    /// `design::validate_design` so one malformed block doesn't abort parsing
    /// before its id is known.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Opaque to the core; carried through untouched for round-tripping.
    #[serde(default)]
    pub position: Value,
    pub data: BlockData,
}

impl Block {
    pub fn pattern(&self) -> Option<BlockPattern> {
        BlockPattern::parse(&self.block_type)
    }
}
