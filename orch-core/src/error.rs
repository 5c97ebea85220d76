//! Error taxonomy for the orchestration core.
//!
//! `ParseError` is recovered locally by its callers (hierarchical delegation,
//! dynamic routing — see `patterns::hierarchical` and `patterns::routing`) and
//! never escapes to a run's top level. Every other variant terminates the
//! current block and the run.

use thiserror::Error;

/// Maximum length of an error message stored on an `ExecutionLog`.
pub const ERROR_TRUNCATE_LIMIT: usize = 4096;

/// Truncates `message` to `ERROR_TRUNCATE_LIMIT` bytes on a char boundary.
pub fn truncate_error(message: &str) -> String {
    if message.len() <= ERROR_TRUNCATE_LIMIT {
        return message.to_string();
    }
    let mut end = ERROR_TRUNCATE_LIMIT;
    while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &message[..end])
}

#[derive(Debug, Error, Clone)]
pub enum OrchestraError {
    /// Cycle, unknown block id, or unknown pattern. Reported at run start; never retried.
    #[error("design invalid: {0}")]
    DesignInvalid(String),

    /// No usable credential for the requested call.
    #[error("agent '{agent}' has no usable provider credential")]
    ProviderAuth { agent: String },

    /// Provider signaled rate limiting.
    #[error("agent '{agent}' was rate limited: {message}")]
    ProviderRateLimited { agent: String, message: String },

    /// Retryable network/provider failure. The core does not retry internally.
    #[error("agent '{agent}' hit a transient provider error: {message}")]
    ProviderTransient { agent: String, message: String },

    /// Unrecoverable provider response.
    #[error("agent '{agent}' hit a fatal provider error: {message}")]
    ProviderFatal { agent: String, message: String },

    /// Malformed delegation/routing JSON. Recovered locally by the caller; this
    /// variant exists so fallback code paths can log what was discarded.
    #[error("failed to parse {what} as JSON: {message}")]
    ParseError { what: String, message: String },

    /// Workspace materialization failed (clone, SSH staging, path validation).
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Cooperative cancellation of a run.
    #[error("run cancelled: {0}")]
    Cancelled(String),
}

impl OrchestraError {
    /// The agent name this error is attributed to, when applicable.
    pub fn agent(&self) -> Option<&str> {
        match self {
            OrchestraError::ProviderAuth { agent }
            | OrchestraError::ProviderRateLimited { agent, .. }
            | OrchestraError::ProviderTransient { agent, .. }
            | OrchestraError::ProviderFatal { agent, .. } => Some(agent),
            _ => None,
        }
    }

    /// Fills in the agent attribution on provider-error variants. A provider
    /// backend may not know which agent it's serving; the caller that does
    /// (the agent runtime) stamps it on the way out.
    pub fn with_agent(mut self, name: &str) -> Self {
        match &mut self {
            OrchestraError::ProviderAuth { agent }
            | OrchestraError::ProviderRateLimited { agent, .. }
            | OrchestraError::ProviderTransient { agent, .. }
            | OrchestraError::ProviderFatal { agent, .. } => {
                *agent = name.to_string();
            }
            _ => {}
        }
        self
    }
}
