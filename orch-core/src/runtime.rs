//! Agent runtime: turns a task message into a provider call against one
//! agent, threading in upstream context and recording the exchange.
//!
//! A prior block or prior turn's output is prefixed onto the task as
//! `Context: ...` whenever one is available; the adapter is chosen per call
//! between the streaming and tool-enabled code paths.

use std::sync::Arc;

use crate::agent::Agent;
use crate::credentials::CredentialStore;
use crate::error::OrchestraError;
use crate::provider::{
    select_provider_kind, LlmClient, ProviderBackend, ProviderEventSink, ProviderKind,
    ProviderOutcome, SessionProviderBackend, StreamingProviderBackend,
};

/// Builds the message actually sent to the model: `task_message` alone, or
/// `Context: {context}\n\nTask: {task_message}` when upstream context exists.
pub fn build_message(task_message: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.trim().is_empty() => format!("Context: {ctx}\n\nTask: {task_message}"),
        _ => task_message.to_string(),
    }
}

pub struct AgentRuntime {
    credentials: Arc<dyn CredentialStore>,
    client: Arc<dyn LlmClient>,
}

impl AgentRuntime {
    pub fn new(credentials: Arc<dyn CredentialStore>, client: Arc<dyn LlmClient>) -> Self {
        Self { credentials, client }
    }

    fn backend_for(&self, kind: ProviderKind) -> Box<dyn ProviderBackend> {
        match kind {
            ProviderKind::Streaming => Box::new(StreamingProviderBackend::new(self.client.clone())),
            ProviderKind::Session => Box::new(SessionProviderBackend::new(self.client.clone())),
        }
    }

    /// Sends `task_message` (optionally wrapped with `context`) to `agent`,
    /// selecting the adapter from the agent's tool capability and the
    /// resolved credential. On success the exchange is recorded on the
    /// agent's history; on failure the error is stamped with the agent's name.
    pub async fn send(
        &self,
        agent: &mut Agent,
        user_id: Option<&str>,
        task_message: &str,
        context: Option<&str>,
        on_event: ProviderEventSink<'_>,
    ) -> Result<ProviderOutcome, OrchestraError> {
        let message = build_message(task_message, context);
        let credential = self.credentials.resolve(user_id);
        let kind = select_provider_kind(&credential, agent.tools_enabled);
        let backend = self.backend_for(kind);

        let outcome = backend
            .invoke(&agent.system_prompt, &message, agent.tools_enabled, on_event)
            .await
            .map_err(|e| e.with_agent(&agent.name))?;

        agent.record_turn(message, outcome.final_text.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::credentials::EnvCredentialStore;
    use crate::provider::MockLlmClient;
    use std::collections::HashMap;

    fn runtime_with_reply(agent_key: &str, reply: &str) -> AgentRuntime {
        let creds = Arc::new(EnvCredentialStore::with_process_key(
            HashMap::new(),
            Some("proc-key".into()),
        ));
        let client = Arc::new(MockLlmClient::scripted(agent_key, reply));
        AgentRuntime::new(creds, client)
    }

    #[test]
    fn build_message_omits_context_when_absent() {
        assert_eq!(build_message("do the thing", None), "do the thing");
        assert_eq!(build_message("do the thing", Some("  ")), "do the thing");
    }

    #[test]
    fn build_message_prefixes_context_when_present() {
        assert_eq!(
            build_message("do the thing", Some("prior output")),
            "Context: prior output\n\nTask: do the thing"
        );
    }

    #[tokio::test]
    async fn send_records_history_and_returns_text() {
        let mut agent = Agent::new("Writer", AgentRole::Worker, "You are Writer, a plain assistant.");
        let runtime = runtime_with_reply("Writer", "the final draft");

        let outcome = runtime
            .send(&mut agent, None, "write the report", None, &|_| {})
            .await
            .unwrap();

        assert_eq!(outcome.final_text, "the final draft");
        assert_eq!(agent.history.len(), 2);
        assert_eq!(agent.history[1].text, "the final draft");
    }

    #[tokio::test]
    async fn send_uses_session_adapter_when_tools_enabled() {
        let mut agent = Agent::new(
            "Coder",
            AgentRole::Worker,
            "You are Coder. You can read file and edit file contents.",
        );
        assert!(agent.tools_enabled);
        let runtime = runtime_with_reply("Coder", "patched");
        let outcome = runtime
            .send(&mut agent, None, "fix the bug", None, &|_| {})
            .await
            .unwrap();
        assert_eq!(outcome.final_text, "patched");
    }
}
