use serde::{Deserialize, Serialize};

/// Maximum number of turns retained per session. Once a conversation grows
/// past this, the oldest turns are dropped (sliding window, not a summary).
pub const MAX_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a conversation. Serializes to the
/// `{"role": ..., "content": ...}` shape the completion API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: String) -> Self {
        Self { role, content }
    }

    pub fn user(content: String) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: String) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: String) -> Self {
        Self::new(Role::System, content)
    }
}

/// Drops the oldest turns until at most [`MAX_HISTORY_TURNS`] remain.
pub fn trim_to_window(history: &mut Vec<Turn>) {
    if history.len() > MAX_HISTORY_TURNS {
        let excess = history.len() - MAX_HISTORY_TURNS;
        history.drain(..excess);
    }
}
