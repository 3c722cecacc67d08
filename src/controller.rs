//! Session lifecycle controller
//!
//! Owns the session record and runs the backend operations against it:
//! start, send, suggestion refresh, reset. Every operation takes
//! `&mut self`, so at most one controller call is ever outstanding; the
//! `busy` flag mirrors that for the presentation layer, which disables its
//! affordances from the snapshot while it is set.

use crate::error::SessionError;
use crate::gateway::Gateway;
use crate::session::{Session, Turn};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionController {
    session: Session,
    gateway: Arc<dyn Gateway>,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            session: Session::default(),
            gateway,
        }
    }

    /// Read-only view of the session record for rendering.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Update the draft input text on behalf of the presentation layer.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.session.pending_input = text.into();
    }

    /// Analyze a video URL and open a learning session for it.
    ///
    /// Any previous session is discarded up front. A failed analysis leaves
    /// the record uninitialized; the error goes back to the caller as a
    /// blocking failure.
    pub async fn start_session(&mut self, url: &str) -> Result<(), SessionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SessionError::Precondition("url must not be empty"));
        }
        if self.session.busy {
            return Err(SessionError::Precondition("another operation is in flight"));
        }

        info!(url, "Starting learning session");
        self.session.clear();
        self.session.busy = true;

        let result = self.gateway.analyze(url).await;
        self.session.busy = false;

        let analysis = result?;
        let welcome = format!(
            "Ready to chat about {}! I've gone through this {} material, \
             so ask away or pick one of the suggested questions.",
            analysis.subject.topic, analysis.subject.subject
        );
        self.session.session_id = analysis.session_id;
        self.session.subject = Some(analysis.subject);
        self.session.history.push(Turn::assistant(welcome));
        self.session.suggestions = analysis.suggested_questions;
        self.session.suggestions_visible = true;

        info!(session_id = %self.session.session_id, "Session started");
        Ok(())
    }

    /// Ask a question within the active session.
    ///
    /// The user turn is appended before the call resolves and stays in the
    /// history even if the call fails; only the assistant turn depends on
    /// the backend answering.
    pub async fn send_message(&mut self, text: &str) -> Result<(), SessionError> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(SessionError::Precondition("message must not be empty"));
        }
        if !self.session.is_active() {
            return Err(SessionError::Precondition("no active session"));
        }
        if self.session.busy {
            return Err(SessionError::Precondition("another operation is in flight"));
        }

        self.session.history.push(Turn::user(text.clone()));
        self.session.pending_input.clear();
        self.session.suggestions_visible = false;
        self.session.busy = true;

        // Screenshot field stays empty here: screen checks travel through
        // the capture pipeline, not the chat turn.
        let result = self.gateway.chat(&self.session.session_id, &text, "").await;
        self.session.busy = false;

        let answer = result?;
        self.session.history.push(Turn::assistant(answer));
        Ok(())
    }

    /// Replace the suggested questions with a fresh set.
    ///
    /// A failed refresh keeps the previous list and is only logged; unlike
    /// start/send it never surfaces a blocking error.
    pub async fn refresh_suggestions(&mut self) -> Result<(), SessionError> {
        if !self.session.is_active() {
            return Err(SessionError::Precondition("no active session"));
        }
        if self.session.busy {
            return Err(SessionError::Precondition("another operation is in flight"));
        }

        self.session.busy = true;
        let result = self.gateway.suggestions(&self.session.session_id).await;
        self.session.busy = false;

        match result {
            Ok(suggestions) => {
                self.session.suggestions = suggestions;
                self.session.suggestions_visible = true;
            }
            Err(e) => warn!("Failed to refresh suggestions: {}", e),
        }
        Ok(())
    }

    /// Drop the active session, gated on the confirmation collaborator.
    ///
    /// Declining leaves every field untouched.
    pub fn reset_session<F>(&mut self, confirm: F)
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            info!("Session reset declined");
            return;
        }
        self.session.clear();
        info!("Session reset");
    }

    /// Show or hide the suggestion panel.
    pub fn toggle_suggestions_visible(&mut self) {
        self.session.suggestions_visible = !self.session.suggestions_visible;
    }
}
