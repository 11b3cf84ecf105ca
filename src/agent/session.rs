//! In-memory session state
//!
//! Each session holds a bounded history of prior user/assistant
//! exchanges, supplied to the orchestrator as initial context. Sessions
//! are created lazily on first use, live only in process memory, and
//! carry no persistence guarantee across restarts.

use crate::error::{CoursemateError, Result};
use crate::providers::Message;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// One completed user/assistant exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug)]
struct Session {
    exchanges: Vec<Exchange>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

/// Store of independent per-session histories.
///
/// Shared across concurrent requests behind a `RwLock`; no lock is ever
/// held across an await point.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_history: usize,
}

impl SessionStore {
    /// Creates a store retaining at most `max_history` exchanges per
    /// session.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Allocates a fresh session id.
    ///
    /// The session itself is created lazily on the first recorded
    /// exchange.
    pub fn create_session(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Prior exchanges for a session as alternating user/assistant
    /// messages, oldest first. Unknown sessions yield an empty history.
    pub fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CoursemateError::Session("session store lock poisoned".to_string()))?;

        let Some(session) = sessions.get(session_id) else {
            return Ok(Vec::new());
        };

        let mut messages = Vec::with_capacity(session.exchanges.len() * 2);
        for exchange in &session.exchanges {
            messages.push(Message::user(&exchange.user));
            messages.push(Message::assistant(&exchange.assistant));
        }
        Ok(messages)
    }

    /// Records a completed exchange, creating the session lazily and
    /// trimming to the configured maximum retained exchanges.
    pub fn record_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CoursemateError::Session("session store lock poisoned".to_string()))?;

        let now = Utc::now();
        let session = sessions.entry(session_id.to_string()).or_insert_with(|| Session {
            exchanges: Vec::new(),
            created_at: now,
            last_active: now,
        });

        session.exchanges.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        if session.exchanges.len() > self.max_history {
            let excess = session.exchanges.len() - self.max_history;
            session.exchanges.drain(..excess);
        }
        session.last_active = now;
        Ok(())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether no session has recorded an exchange yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When a session was created and last used, if it exists.
    pub fn activity(&self, session_id: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.sessions
            .read()
            .ok()?
            .get(session_id)
            .map(|s| (s.created_at, s.last_active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_has_empty_history() {
        let store = SessionStore::new(2);
        assert!(store.history("missing").unwrap().is_empty());
    }

    #[test]
    fn test_history_alternates_roles_oldest_first() {
        let store = SessionStore::new(5);
        store.record_exchange("s1", "first question", "first answer").unwrap();
        store.record_exchange("s1", "second question", "second answer").unwrap();

        let history = store.history("s1").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content.as_deref(), Some("first question"));
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[3].content.as_deref(), Some("second answer"));
    }

    #[test]
    fn test_history_trimmed_to_max() {
        let store = SessionStore::new(2);
        for i in 0..5 {
            store
                .record_exchange("s1", &format!("q{i}"), &format!("a{i}"))
                .unwrap();
        }
        let history = store.history("s1").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content.as_deref(), Some("q3"));
        assert_eq!(history[2].content.as_deref(), Some("q4"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new(2);
        store.record_exchange("a", "question a", "answer a").unwrap();
        store.record_exchange("b", "question b", "answer b").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.history("a").unwrap()[0].content.as_deref(),
            Some("question a")
        );
    }

    #[test]
    fn test_create_session_ids_unique() {
        let store = SessionStore::new(2);
        let a = store.create_session();
        let b = store.create_session();
        assert_ne!(a, b);
        // Lazy creation: no session exists until an exchange is recorded.
        assert!(store.is_empty());
    }

    #[test]
    fn test_activity_tracked() {
        let store = SessionStore::new(2);
        assert!(store.activity("s1").is_none());
        store.record_exchange("s1", "q", "a").unwrap();
        let (created, last) = store.activity("s1").unwrap();
        assert!(created <= last);
    }
}
