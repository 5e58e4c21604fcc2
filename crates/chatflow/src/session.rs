//! Per-conversation session state.
//!
//! A [`Session`] outlives a single inbound event: the caller loads it before
//! dispatching an event and stores it afterwards. It carries the open-dialog
//! marker (which dialog awaits the user's reply) and the leftover reading
//! delay bridged from one playback into the next turn.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record of the dialog awaiting the next inbound reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpenDialogMarker {
    /// Id of the dialog awaiting a reply.
    pub dialog_id: String,
    /// Namespace of the manager owning the dialog, if it has one.
    pub namespace: Option<String>,
}

impl OpenDialogMarker {
    /// Create a marker for a dialog.
    pub fn new(dialog_id: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            namespace,
        }
    }

    /// Check whether this marker belongs to a manager with `namespace`.
    #[must_use]
    pub fn in_namespace(&self, namespace: Option<&str>) -> bool {
        self.namespace.as_deref() == namespace
    }
}

/// Mutable per-conversation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SessionRecord", into = "SessionRecord")]
pub struct Session {
    open_dialog: Option<OpenDialogMarker>,
    leftover_delay: Option<Duration>,
    data: Map<String, Value>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the open-dialog marker.
    #[must_use]
    pub const fn open_dialog(&self) -> Option<&OpenDialogMarker> {
        self.open_dialog.as_ref()
    }

    /// Mark a dialog as awaiting the next reply, replacing any previous marker.
    pub fn set_open_dialog(&mut self, marker: OpenDialogMarker) {
        self.open_dialog = Some(marker);
    }

    /// Remove and return the open-dialog marker.
    pub fn take_open_dialog(&mut self) -> Option<OpenDialogMarker> {
        self.open_dialog.take()
    }

    /// Remove the open-dialog marker.
    pub fn clear_open_dialog(&mut self) {
        self.open_dialog = None;
    }

    /// Get the leftover reading delay from the previous playback.
    #[must_use]
    pub const fn leftover_delay(&self) -> Option<Duration> {
        self.leftover_delay
    }

    /// Record the reading delay still owed after the last message.
    pub fn set_leftover_delay(&mut self, delay: Duration) {
        self.leftover_delay = Some(delay);
    }

    /// Remove and return the leftover delay.
    pub fn take_leftover_delay(&mut self) -> Option<Duration> {
        self.leftover_delay.take()
    }

    /// Remove the leftover delay.
    pub fn clear_leftover_delay(&mut self) {
        self.leftover_delay = None;
    }

    /// Get a caller-owned field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a caller-owned field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Remove a caller-owned field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Get all caller-owned fields.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Wire layout of a session, compatible with the plain-field form.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    open_dialog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    open_dialog_namespace: Option<String>,
    #[serde(
        rename = "_leftover_dialog_delay",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    leftover_delay_ms: Option<u64>,
    #[serde(flatten)]
    data: Map<String, Value>,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            // A namespace without a dialog id is meaningless and dropped.
            open_dialog: record
                .open_dialog
                .map(|id| OpenDialogMarker::new(id, record.open_dialog_namespace)),
            leftover_delay: record.leftover_delay_ms.map(Duration::from_millis),
            data: record.data,
        }
    }
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        let (open_dialog, open_dialog_namespace) = match session.open_dialog {
            Some(marker) => (Some(marker.dialog_id), marker.namespace),
            None => (None, None),
        };
        Self {
            open_dialog,
            open_dialog_namespace,
            leftover_delay_ms: session.leftover_delay.map(|d| d.as_millis() as u64),
            data: session.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn marker_set_take() {
        let mut session = Session::new();
        assert!(session.open_dialog().is_none());

        session.set_open_dialog(OpenDialogMarker::new("ask_name", None));
        assert_eq!(session.open_dialog().unwrap().dialog_id, "ask_name");

        let marker = session.take_open_dialog().unwrap();
        assert_eq!(marker.dialog_id, "ask_name");
        assert!(session.open_dialog().is_none());
    }

    #[test]
    fn marker_namespace_match() {
        let plain = OpenDialogMarker::new("a", None);
        assert!(plain.in_namespace(None));
        assert!(!plain.in_namespace(Some("onboarding")));

        let tagged = OpenDialogMarker::new("a", Some("onboarding".into()));
        assert!(tagged.in_namespace(Some("onboarding")));
        assert!(!tagged.in_namespace(Some("billing")));
        assert!(!tagged.in_namespace(None));
    }

    #[test]
    fn leftover_delay_is_taken_once() {
        let mut session = Session::new();
        session.set_leftover_delay(Duration::from_millis(120));
        assert_eq!(session.take_leftover_delay(), Some(Duration::from_millis(120)));
        assert_eq!(session.take_leftover_delay(), None);
    }

    #[test]
    fn serializes_plain_fields() {
        let mut session = Session::new();
        session.set_open_dialog(OpenDialogMarker::new("survey", Some("nps".into())));
        session.set_leftover_delay(Duration::from_millis(90));
        session.insert("user_name", "Ada");

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({
                "open_dialog": "survey",
                "open_dialog_namespace": "nps",
                "_leftover_dialog_delay": 90,
                "user_name": "Ada",
            })
        );

        let back: Session = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn empty_session_serializes_to_empty_object() {
        let value = serde_json::to_value(Session::new()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn namespace_without_dialog_is_dropped() {
        let session: Session =
            serde_json::from_value(json!({ "open_dialog_namespace": "nps" })).unwrap();
        assert!(session.open_dialog().is_none());
    }
}
