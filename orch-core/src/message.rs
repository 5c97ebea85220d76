//! History entries for an agent's conversation: ordered (speaker, text) pairs.

use serde::{Deserialize, Serialize};

/// Who produced one turn of an agent's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One (speaker, text) pair. History is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_the_right_speaker() {
        assert_eq!(HistoryEntry::user("hi").speaker, Speaker::User);
        assert_eq!(HistoryEntry::assistant("hi").speaker, Speaker::Assistant);
    }
}
