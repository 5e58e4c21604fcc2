//! Inbound events and outbound payloads.
//!
//! An [`Event`] is one inbound turn (a chat message, a postback, ...). It
//! carries the [`Transport`] used to answer, so a handler replies through
//! the event it is processing.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::TransportError;

/// A message payload, optionally carrying actions for the client to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The message text.
    pub message: String,
    /// Opaque actions (buttons, quick replies), passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
}

impl Response {
    /// Create a response with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actions: None,
        }
    }

    /// Attach actions to the response.
    #[must_use]
    pub fn with_actions(mut self, actions: Value) -> Self {
        self.actions = Some(actions);
        self
    }
}

/// A payload sent to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    /// Toggle the typing indicator.
    Typing {
        /// Whether the indicator should be shown.
        typing: bool,
    },
    /// Deliver a message.
    Message(Response),
}

impl Outbound {
    /// Create a typing indicator payload.
    #[must_use]
    pub const fn typing(on: bool) -> Self {
        Self::Typing { typing: on }
    }

    /// Create a message payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(Response::new(message))
    }

    /// Check if this is a typing indicator.
    #[must_use]
    pub const fn is_typing(&self) -> bool {
        matches!(self, Self::Typing { .. })
    }

    /// Get the response if this is a message payload.
    #[must_use]
    pub const fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Message(response) => Some(response),
            Self::Typing { .. } => None,
        }
    }
}

impl From<Response> for Outbound {
    fn from(response: Response) -> Self {
        Self::Message(response)
    }
}

/// Delivers outbound payloads to the user.
pub trait Transport: Send + Sync {
    /// Send one payload.
    fn send(&self, payload: Outbound) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// An inbound event.
#[derive(Clone)]
pub struct Event {
    text: Option<String>,
    data: Value,
    transport: Arc<dyn Transport>,
}

impl Event {
    /// Create an event with no text.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            text: None,
            data: Value::Null,
            transport,
        }
    }

    /// Create a text message event.
    pub fn message(text: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            text: Some(text.into()),
            data: Value::Null,
            transport,
        }
    }

    /// Attach opaque event data (postback payloads, attachments, ...).
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Get the event text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Get the event data.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Get the transport replies go through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send a payload back to the user.
    pub async fn send(&self, payload: impl Into<Outbound>) -> Result<(), TransportError> {
        self.transport.send(payload.into()).await
    }

    /// Send a plain text message back to the user.
    pub async fn reply(&self, message: impl Into<String>) -> Result<(), TransportError> {
        self.send(Outbound::message(message)).await
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("text", &self.text)
            .field("data", &self.data)
            .finish()
    }
}

/// A payload captured by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPayload {
    /// The payload.
    pub payload: Outbound,
    /// Time since the transport was created.
    pub at: Duration,
}

#[derive(Debug)]
struct RecordingState {
    payloads: Vec<RecordedPayload>,
    messages_sent: usize,
    fail_at_message: Option<usize>,
    fail_typing: bool,
}

/// An in-memory transport that records every payload.
///
/// Handy for tests and local harnesses. It can be told to fail the k-th
/// message delivery (1-based) to exercise transport failures.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    state: Arc<Mutex<RecordingState>>,
    started: Instant,
}

impl RecordingTransport {
    /// Create a new recording transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState {
                payloads: Vec::new(),
                messages_sent: 0,
                fail_at_message: None,
                fail_typing: false,
            })),
            started: Instant::now(),
        }
    }

    /// Fail the `k`-th message delivery (1-based); typing payloads don't count.
    #[must_use]
    pub fn failing_at(self, k: usize) -> Self {
        self.lock().fail_at_message = Some(k);
        self
    }

    /// Fail every typing indicator delivery.
    #[must_use]
    pub fn failing_typing(self) -> Self {
        self.lock().fail_typing = true;
        self
    }

    /// Wrap the transport for use in an [`Event`].
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    /// Get every recorded payload.
    #[must_use]
    pub fn payloads(&self) -> Vec<RecordedPayload> {
        self.lock().payloads.clone()
    }

    /// Get the recorded message payloads, in order.
    #[must_use]
    pub fn responses(&self) -> Vec<Response> {
        self.lock()
            .payloads
            .iter()
            .filter_map(|p| p.payload.as_response().cloned())
            .collect()
    }

    /// Get the recorded message texts, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.responses().into_iter().map(|r| r.message).collect()
    }

    /// Get the recorded typing indicator states, in order.
    #[must_use]
    pub fn typing_states(&self) -> Vec<bool> {
        self.lock()
            .payloads
            .iter()
            .filter_map(|p| match p.payload {
                Outbound::Typing { typing } => Some(typing),
                Outbound::Message(_) => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.payloads.clear();
        state.messages_sent = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        // The state holds no invariants a panicking holder could break.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, payload: Outbound) -> BoxFuture<'_, Result<(), TransportError>> {
        let at = self.started.elapsed();
        let result = {
            let mut state = self.lock();
            if payload.is_typing() {
                if state.fail_typing {
                    Err(TransportError::delivery("typing indicator rejected"))
                } else {
                    state.payloads.push(RecordedPayload { payload, at });
                    Ok(())
                }
            } else {
                state.messages_sent += 1;
                if state.fail_at_message == Some(state.messages_sent) {
                    Err(TransportError::delivery(format!(
                        "message {} rejected",
                        state.messages_sent
                    )))
                } else {
                    state.payloads.push(RecordedPayload { payload, at });
                    Ok(())
                }
            }
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_wire_format() {
        assert_eq!(
            serde_json::to_value(Outbound::typing(true)).unwrap(),
            json!({ "typing": true })
        );
        assert_eq!(
            serde_json::to_value(Outbound::message("hi")).unwrap(),
            json!({ "message": "hi" })
        );

        let with_actions = Response::new("pick one").with_actions(json!(["yes", "no"]));
        assert_eq!(
            serde_json::to_value(Outbound::from(with_actions)).unwrap(),
            json!({ "message": "pick one", "actions": ["yes", "no"] })
        );
    }

    #[test]
    fn outbound_parses_back() {
        let typing: Outbound = serde_json::from_value(json!({ "typing": false })).unwrap();
        assert_eq!(typing, Outbound::typing(false));

        let message: Outbound = serde_json::from_value(json!({ "message": "ok" })).unwrap();
        assert_eq!(message.as_response().unwrap().message, "ok");
    }

    #[tokio::test]
    async fn recording_transport_records() {
        let transport = RecordingTransport::new();
        let event = Event::message("hello", transport.shared());

        event.send(Outbound::typing(true)).await.unwrap();
        event.reply("hi there").await.unwrap();

        assert_eq!(transport.messages(), vec!["hi there"]);
        assert_eq!(transport.typing_states(), vec![true]);
        assert_eq!(event.text(), Some("hello"));
    }

    #[tokio::test]
    async fn recording_transport_fails_kth_message() {
        let transport = RecordingTransport::new().failing_at(2);
        let event = Event::new(transport.shared());

        event.reply("one").await.unwrap();
        event.send(Outbound::typing(true)).await.unwrap();
        assert!(event.reply("two").await.is_err());
        event.reply("three").await.unwrap();

        assert_eq!(transport.messages(), vec!["one", "three"]);
    }
}
