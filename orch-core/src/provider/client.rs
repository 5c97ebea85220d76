//! The low-level completion call a provider backend wraps.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::OrchestraError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_create_tokens: u64,
    pub cache_read_tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: LlmUsage,
}

/// A model completion call, independent of streaming/session framing.
/// `tools_enabled` asks the client to surface tool calls in the response
/// rather than, say, refusing or narrating them as text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools_enabled: bool,
    ) -> Result<LlmResponse, OrchestraError>;
}
