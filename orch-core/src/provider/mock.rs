//! Deterministic test double for `LlmClient`.

use async_trait::async_trait;
use dashmap::DashMap;

use super::client::{LlmClient, LlmResponse, LlmUsage, ToolCallRequest};
use crate::error::OrchestraError;

/// Returns a scripted reply keyed by a substring of the system prompt (the
/// orchestrator always puts the agent's name at the top of its system
/// prompt, so keying on that is enough to give each agent in a test its own
/// voice). Falls back to a fixed default when nothing matches.
pub struct MockLlmClient {
    scripts: DashMap<String, String>,
    default_reply: String,
    tool_calls: DashMap<String, Vec<ToolCallRequest>>,
}

impl MockLlmClient {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            scripts: DashMap::new(),
            default_reply: default_reply.into(),
            tool_calls: DashMap::new(),
        }
    }

    /// Convenience constructor for a single scripted agent.
    pub fn scripted(agent_key: impl Into<String>, reply: impl Into<String>) -> Self {
        let mock = Self::new("");
        mock.scripts.insert(agent_key.into(), reply.into());
        mock
    }

    pub fn set_reply(&self, agent_key: impl Into<String>, reply: impl Into<String>) {
        self.scripts.insert(agent_key.into(), reply.into());
    }

    pub fn set_tool_calls(&self, agent_key: impl Into<String>, calls: Vec<ToolCallRequest>) {
        self.tool_calls.insert(agent_key.into(), calls);
    }

    fn lookup(&self, system_prompt: &str) -> String {
        for entry in self.scripts.iter() {
            if system_prompt.contains(entry.key().as_str()) {
                return entry.value().clone();
            }
        }
        self.default_reply.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        _user_message: &str,
        _tools_enabled: bool,
    ) -> Result<LlmResponse, OrchestraError> {
        let tool_calls = self
            .tool_calls
            .iter()
            .find(|entry| system_prompt.contains(entry.key().as_str()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(LlmResponse {
            text: self.lookup(system_prompt),
            tool_calls,
            usage: LlmUsage::default(),
        })
    }
}

/// Returns the user message verbatim as its reply. Useful for graph-executor
/// tests that need to observe exactly what context threading produced.
pub struct EchoLlmClient;

#[async_trait]
impl LlmClient for EchoLlmClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_message: &str,
        _tools_enabled: bool,
    ) -> Result<LlmResponse, OrchestraError> {
        Ok(LlmResponse {
            text: user_message.to_string(),
            tool_calls: Vec::new(),
            usage: LlmUsage::default(),
        })
    }
}
