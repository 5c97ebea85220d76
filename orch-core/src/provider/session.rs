//! Session adapter: whole-response completion with tool-call visibility.

use async_trait::async_trait;
use std::sync::Arc;

use super::{LlmClient, ProviderBackend, ProviderEvent, ProviderEventSink, ProviderKind, ProviderOutcome};
use crate::error::OrchestraError;

pub struct SessionProviderBackend {
    client: Arc<dyn LlmClient>,
}

impl SessionProviderBackend {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderBackend for SessionProviderBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Session
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools_enabled: bool,
        on_event: ProviderEventSink<'_>,
    ) -> Result<ProviderOutcome, OrchestraError> {
        let response = self
            .client
            .complete(system_prompt, user_message, tools_enabled)
            .await?;

        for call in &response.tool_calls {
            on_event(ProviderEvent::ToolCall {
                name: call.name.clone(),
                input: call.input.clone(),
            });
        }

        Ok(ProviderOutcome {
            final_text: response.text,
            usage: response.usage,
        })
    }
}
