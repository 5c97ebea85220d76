//! Provider adapter contract.
//!
//! The core never talks to a concrete model API itself — it depends only on
//! this contract. An `LlmClient` is the low-level completion call; a
//! `ProviderBackend` wraps one as either a streaming (token-level) adapter or
//! a session (whole-response, tool-call-aware) adapter.

pub mod client;
pub mod mock;
pub mod session;
pub mod streaming;

pub use client::{LlmClient, LlmResponse, LlmUsage, ToolCallRequest};
pub use mock::{EchoLlmClient, MockLlmClient};
pub use session::SessionProviderBackend;
pub use streaming::StreamingProviderBackend;

use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::Credential;
use crate::error::OrchestraError;

/// Which concrete adapter a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Streaming,
    Session,
}

/// Adapter selection rule: no usable API credential forces session mode (the
/// session adapter is assumed to ride on an already-authenticated local
/// session rather than a bearer key); otherwise a tool-enabled agent needs
/// the session adapter to see tool calls, and everything else gets the
/// cheaper streaming adapter.
pub fn select_provider_kind(credential: &Credential, tools_enabled: bool) -> ProviderKind {
    match credential {
        Credential::SessionOnly => ProviderKind::Session,
        Credential::ApiKey(_) if tools_enabled => ProviderKind::Session,
        Credential::ApiKey(_) => ProviderKind::Streaming,
    }
}

/// One event surfaced by a provider call before it finishes.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Chunk(String),
    ToolCall { name: String, input: Value },
}

/// The result of a completed provider call.
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub final_text: String,
    pub usage: LlmUsage,
}

/// Synchronous, non-blocking event sink. Implementations hand events to a
/// bounded channel (see `eventbus::RunEventBus`) rather than await inline, so
/// a provider backend can call it from a plain (non-async) closure context.
pub type ProviderEventSink<'a> = &'a (dyn Fn(ProviderEvent) + Send + Sync);

#[async_trait]
pub trait ProviderBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn invoke(
        &self,
        system_prompt: &str,
        user_message: &str,
        tools_enabled: bool,
        on_event: ProviderEventSink<'_>,
    ) -> Result<ProviderOutcome, OrchestraError>;
}
