//! `Agent`: a named LLM persona within a block.

use serde::{Deserialize, Serialize};

use crate::message::HistoryEntry;

/// Role an agent plays within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Manager,
    Worker,
    Specialist,
    Moderator,
    Reflector,
}

/// Keyword set used by `infer_tools_enabled`.
const TOOL_KEYWORDS: &[&str] = &[
    "file",
    "bash",
    "command",
    "execute",
    "run code",
    "terminal",
    "search web",
    "fetch",
    "download",
    "upload",
    "create file",
    "read file",
    "write file",
    "edit file",
    "directory",
    "folder",
    "script",
    "mcp",
    "tool",
];

/// Pure function: does this system prompt imply tool use? Kept as a single pure
/// function rather than scattered heuristics so agent construction stays testable.
pub fn infer_tools_enabled(system_prompt: &str) -> bool {
    let lower = system_prompt.to_lowercase();
    TOOL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// A named LLM persona. `tools_enabled` is immutable once constructed;
/// `history` is append-only via `record_turn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub role: AgentRole,
    pub system_prompt: String,
    pub tools_enabled: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Agent {
    /// Creates an agent, auto-inferring `tools_enabled` from the system prompt.
    pub fn new(name: impl Into<String>, role: AgentRole, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        let tools_enabled = infer_tools_enabled(&system_prompt);
        Self {
            name: name.into(),
            role,
            system_prompt,
            tools_enabled,
            history: Vec::new(),
        }
    }

    /// Creates an agent with an explicit tool-capability flag, bypassing inference.
    pub fn with_tools_enabled(
        name: impl Into<String>,
        role: AgentRole,
        system_prompt: impl Into<String>,
        tools_enabled: bool,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            system_prompt: system_prompt.into(),
            tools_enabled,
            history: Vec::new(),
        }
    }

    /// Appends one (user, assistant) exchange to history. History is append-only.
    pub fn record_turn(&mut self, user_message: impl Into<String>, assistant_reply: impl Into<String>) {
        self.history.push(HistoryEntry::user(user_message));
        self.history.push(HistoryEntry::assistant(assistant_reply));
    }
}
