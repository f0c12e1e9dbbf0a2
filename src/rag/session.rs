//! Conversation sessions.
//!
//! A session keeps the last few question/answer exchanges so a follow-up
//! question can be answered with the earlier turns in view.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug, Clone)]
struct Exchange {
    user: String,
    assistant: String,
}

/// Bounded per-session conversation history.
#[derive(Debug)]
pub struct SessionManager {
    max_history: usize,
    next_id: u64,
    sessions: HashMap<String, VecDeque<Exchange>>,
}

impl SessionManager {
    /// Create a manager keeping at most `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            next_id: 0,
            sessions: HashMap::new(),
        }
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&mut self) -> String {
        self.next_id += 1;
        let id = format!("session_{}", self.next_id);
        self.sessions.insert(id.clone(), VecDeque::new());
        debug!("Created {}", id);
        id
    }

    /// Record one exchange. Unknown ids start a new session under that id.
    pub fn add_exchange(&mut self, session_id: &str, user: &str, assistant: &str) {
        let history = self.sessions.entry(session_id.to_string()).or_default();
        history.push_back(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    /// Rendered history, oldest first, or `None` if the session has none.
    pub fn history(&self, session_id: &str) -> Option<String> {
        let history = self.sessions.get(session_id)?;
        if history.is_empty() {
            return None;
        }

        let lines: Vec<String> = history
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect();
        Some(lines.join("\n"))
    }

    /// Forget a session's history. The id stays valid.
    pub fn clear_session(&mut self, session_id: &str) {
        if let Some(history) = self.sessions.get_mut(session_id) {
            history.clear();
        }
    }

    /// Whether the id refers to a known session.
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }
}
