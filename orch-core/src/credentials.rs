//! Provider credential resolution.
//!
//! A run can be started by a user with their own key, fall back to a
//! process-wide operator key, or run in a "session-only" mode where no key is
//! held at all and the provider backend is expected to use an
//! already-authenticated local session (e.g. a logged-in CLI).

use std::collections::HashMap;
use std::env;

/// Outcome of resolving a credential for one agent's provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    SessionOnly,
}

/// Resolves provider credentials in priority order: a key scoped to the
/// requesting user, then a process-wide key, then a session-only fallback.
pub trait CredentialStore: Send + Sync {
    fn user_key(&self, user_id: &str) -> Option<String>;
    fn process_key(&self) -> Option<String>;

    /// Three-tier resolution. Never fails: the bottom tier always succeeds.
    fn resolve(&self, user_id: Option<&str>) -> Credential {
        if let Some(user_id) = user_id {
            if let Some(key) = self.user_key(user_id) {
                return Credential::ApiKey(key);
            }
        }
        if let Some(key) = self.process_key() {
            return Credential::ApiKey(key);
        }
        Credential::SessionOnly
    }
}

/// Environment-variable-backed credential store. User keys come from an
/// in-memory map supplied by the embedder; the process key is read once from
/// `ANTHROPIC_API_KEY`, falling back to `CLAUDE_API_KEY`.
pub struct EnvCredentialStore {
    user_keys: HashMap<String, String>,
    process_key: Option<String>,
}

impl EnvCredentialStore {
    pub fn from_env(user_keys: HashMap<String, String>) -> Self {
        let process_key = env::var("ANTHROPIC_API_KEY")
            .or_else(|_| env::var("CLAUDE_API_KEY"))
            .ok();
        Self {
            user_keys,
            process_key,
        }
    }

    pub fn with_process_key(user_keys: HashMap<String, String>, process_key: Option<String>) -> Self {
        Self {
            user_keys,
            process_key,
        }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn user_key(&self, user_id: &str) -> Option<String> {
        self.user_keys.get(user_id).cloned()
    }

    fn process_key(&self) -> Option<String> {
        self.process_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_user_key_over_process_key() {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), "user-key".to_string());
        let store = EnvCredentialStore::with_process_key(users, Some("proc-key".into()));
        assert_eq!(
            store.resolve(Some("alice")),
            Credential::ApiKey("user-key".into())
        );
    }

    #[test]
    fn falls_back_to_process_key_when_user_has_none() {
        let store = EnvCredentialStore::with_process_key(HashMap::new(), Some("proc-key".into()));
        assert_eq!(
            store.resolve(Some("bob")),
            Credential::ApiKey("proc-key".into())
        );
        assert_eq!(store.resolve(None), Credential::ApiKey("proc-key".into()));
    }

    #[test]
    fn falls_back_to_session_only_when_nothing_is_configured() {
        let store = EnvCredentialStore::with_process_key(HashMap::new(), None);
        assert_eq!(store.resolve(Some("bob")), Credential::SessionOnly);
        assert_eq!(store.resolve(None), Credential::SessionOnly);
    }
}
