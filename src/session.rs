//! Learning session state
//!
//! Holds the single mutable session record the controller owns and the
//! presentation layer renders. An empty `session_id` is the authoritative
//! "no active session" marker.

use serde::{Deserialize, Serialize};

/// Profile of the analyzed content, set once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Broad domain, e.g. "coding", "history", "science"
    pub subject: String,
    /// Specific topic being taught
    pub topic: String,
    /// Difficulty: "beginner", "intermediate" or "advanced"
    pub level: String,
    /// Key concepts covered by the content
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The single learning session record.
///
/// Exactly one of these exists per client. `session_id`, `subject` and
/// `history` move together: all empty when no session is active, all
/// populated while one is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    /// Backend-issued identifier; empty means no active session
    pub session_id: String,
    /// Analyzed content profile, `None` when no session is active
    pub subject: Option<Subject>,
    /// Conversation so far, append-only while the session lives
    pub history: Vec<Turn>,
    /// Current suggested questions, replaced wholesale on refresh
    pub suggestions: Vec<String>,
    /// Whether the suggestion panel is shown
    pub suggestions_visible: bool,
    /// True while a controller-initiated gateway call is outstanding
    pub busy: bool,
    /// Draft input text, cleared when a message is sent or session reset
    pub pending_input: String,
}

impl Session {
    /// Whether a learning session is currently active.
    pub fn is_active(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Drop all session state, returning to the uninitialized record.
    ///
    /// `busy` is deliberately left alone: it tracks the request in flight,
    /// not the session.
    pub fn clear(&mut self) {
        self.session_id.clear();
        self.subject = None;
        self.history.clear();
        self.suggestions.clear();
        self.suggestions_visible = false;
        self.pending_input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_inactive() {
        let session = Session::default();
        assert!(!session.is_active());
        assert!(session.subject.is_none());
        assert!(session.history.is_empty());
        assert!(!session.busy);
    }

    #[test]
    fn test_clear_resets_everything_but_busy() {
        let mut session = Session {
            session_id: "abc123".into(),
            subject: Some(Subject {
                subject: "coding".into(),
                topic: "Loops".into(),
                level: "beginner".into(),
                concepts: vec!["for".into(), "while".into()],
            }),
            history: vec![Turn::user("why?")],
            suggestions: vec!["What is a loop?".into()],
            suggestions_visible: true,
            busy: true,
            pending_input: "half-typed".into(),
        };

        session.clear();

        assert!(!session.is_active());
        assert!(session.subject.is_none());
        assert!(session.history.is_empty());
        assert!(session.suggestions.is_empty());
        assert!(!session.suggestions_visible);
        assert!(session.pending_input.is_empty());
        assert!(session.busy);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = Turn::assistant("hello");
        let json = serde_json::to_string(&turn).expect("Failed to serialize");
        assert!(json.contains(r#""role":"assistant""#));

        let parsed: Turn = serde_json::from_str(r#"{"role":"user","content":"hi"}"#)
            .expect("Failed to deserialize");
        assert_eq!(parsed.role, Role::User);
    }
}
