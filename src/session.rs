//! Conversation sessions and their append-only history

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only sequence of turns for one session
///
/// Replayed verbatim to the chat service on every call, so insertion order is
/// significant. Turns are never removed, reordered, or edited.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn to the end of the history
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Full ordered sequence, oldest first
    #[must_use]
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Session context handed to each request handler
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    history: ConversationHistory,
}

impl Session {
    /// Start a new session with an empty history
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            history: ConversationHistory::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub const fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a session; the mutex serializes requests within it
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory registry of live sessions, keyed by session ID
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new empty session
    pub async fn create(&self) -> (String, SessionHandle) {
        let session = Session::new();
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id.clone(), handle.clone());
        tracing::debug!(session_id = %id, "session started");
        (id, handle)
    }

    /// Look up an existing session
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// End a session, discarding its history
    ///
    /// Returns `false` if no such session existed.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
