//! Token-level streaming adapter: no tool visibility, chunked `on_event` output.

use async_trait::async_trait;
use std::sync::Arc;

use super::{LlmClient, ProviderBackend, ProviderEvent, ProviderEventSink, ProviderKind, ProviderOutcome};
use crate::error::OrchestraError;

const DEFAULT_CHUNK_BYTES: usize = 32;

pub struct StreamingProviderBackend {
    client: Arc<dyn LlmClient>,
    chunk_bytes: usize,
}

impl StreamingProviderBackend {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    pub fn with_chunk_bytes(client: Arc<dyn LlmClient>, chunk_bytes: usize) -> Self {
        Self { client, chunk_bytes: chunk_bytes.max(1) }
    }
}

#[async_trait]
impl ProviderBackend for StreamingProviderBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Streaming
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        user_message: &str,
        _tools_enabled: bool,
        on_event: ProviderEventSink<'_>,
    ) -> Result<ProviderOutcome, OrchestraError> {
        let response = self.client.complete(system_prompt, user_message, false).await?;

        let mut remaining = response.text.as_str();
        while !remaining.is_empty() {
            let mut boundary = remaining.len().min(self.chunk_bytes);
            while boundary < remaining.len() && !remaining.is_char_boundary(boundary) {
                boundary += 1;
            }
            let (piece, rest) = remaining.split_at(boundary);
            on_event(ProviderEvent::Chunk(piece.to_string()));
            remaining = rest;
        }

        Ok(ProviderOutcome {
            final_text: response.text,
            usage: response.usage,
        })
    }
}
