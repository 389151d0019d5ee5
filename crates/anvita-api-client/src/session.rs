//! Authenticated client session.
//!
//! A session is created on login, handed to the transport at construction, and
//! torn down on logout.

use anvita_core::{UploadError, UploadResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, RwLock};

enum SessionState {
    Inactive,
    Active {
        token: String,
        started_at: DateTime<Utc>,
    },
}

/// Shared handle to the current login. Clones observe the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an inactive session.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::Inactive)),
        }
    }

    /// Creates a session that is already active with `token`.
    pub fn active(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.init(token);
        session
    }

    /// Starts (or restarts) the session with a bearer token.
    pub fn init(&self, token: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = SessionState::Active {
            token: token.into(),
            started_at: Utc::now(),
        };
        tracing::debug!("Session initialised");
    }

    /// Ends the session. Later credential requests fail with `SessionInactive`.
    pub fn teardown(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = SessionState::Inactive;
        tracing::debug!("Session torn down");
    }

    pub fn is_active(&self) -> bool {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        matches!(*state, SessionState::Active { .. })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        match *state {
            SessionState::Active { started_at, .. } => Some(started_at),
            SessionState::Inactive => None,
        }
    }

    /// Current bearer token.
    pub fn bearer(&self) -> UploadResult<String> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        match &*state {
            SessionState::Active { token, .. } => Ok(token.clone()),
            SessionState::Inactive => Err(UploadError::SessionInactive),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_inactive() {
        let session = Session::new();
        assert!(!session.is_active());
        assert!(session.started_at().is_none());
        assert!(matches!(session.bearer(), Err(UploadError::SessionInactive)));
    }

    #[test]
    fn init_then_teardown() {
        let session = Session::new();
        session.init("tok");
        assert!(session.is_active());
        assert_eq!(session.bearer().unwrap(), "tok");
        assert!(session.started_at().is_some());

        session.teardown();
        assert!(!session.is_active());
        assert!(session.bearer().is_err());
    }

    #[test]
    fn clones_share_state() {
        let session = Session::active("tok");
        let handle = session.clone();
        session.teardown();
        assert!(!handle.is_active());
        handle.init("tok2");
        assert_eq!(session.bearer().unwrap(), "tok2");
    }

    #[test]
    fn debug_hides_token() {
        let session = Session::active("super-secret");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
    }
}
