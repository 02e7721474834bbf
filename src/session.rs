use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One conversation with the remote agent: a thread identifier the agent
/// uses to keep multi-turn context, plus the ordered message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ConversationSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

/// Holds the active session for the lifetime of the run.
///
/// The session is created lazily on first use and replaced only by an
/// explicit reset. Nothing here is persisted automatically; `write_transcript`
/// exports on demand.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    current: Option<ConversationSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Return the active session, creating one with a fresh identifier and
    /// empty log if none exists. Repeated calls return the same session.
    pub fn ensure_session(&mut self) -> &ConversationSession {
        self.current.get_or_insert_with(ConversationSession::new)
    }

    /// Thread identifier of the active session, creating it if needed.
    pub fn thread_id(&mut self) -> Uuid {
        self.ensure_session().id
    }

    /// Append a message to the end of the log. Never reorders or edits
    /// prior entries.
    pub fn append(&mut self, message: Message) {
        self.current
            .get_or_insert_with(ConversationSession::new)
            .messages
            .push(message);
    }

    /// Current log in insertion order, oldest first. Empty if no session
    /// has been started yet.
    pub fn snapshot(&self) -> &[Message] {
        self.current
            .as_ref()
            .map(|s| s.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Drop the active session. The next interaction starts a new one with
    /// a fresh thread identifier.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Export the active session as pretty-printed JSON.
    pub fn write_transcript(&self, path: &Path) -> Result<()> {
        let session = self
            .current
            .as_ref()
            .context("No active session to save")?;
        let content = serde_json::to_string_pretty(session)
            .context("Failed to serialize session transcript")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        Ok(())
    }
}
