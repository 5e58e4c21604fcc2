//! Per-turn handler context.

use serde_json::{Map, Value};

use crate::session::Session;

/// State handed to every handler while one inbound event is processed.
///
/// The [`Session`] persists across turns; `locals` only live for the
/// current event and let middleware pass values to later handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The conversation's session.
    pub session: Session,
    /// Values scoped to the current event.
    pub locals: Map<String, Value>,
}

impl Context {
    /// Create a context around a loaded session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            locals: Map::new(),
        }
    }

    /// Consume the context, returning the session to persist.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }
}

impl From<Session> for Context {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
