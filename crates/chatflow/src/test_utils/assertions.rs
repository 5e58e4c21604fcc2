//! Assertion helpers for recorded conversations.

use crate::event::{Outbound, RecordingTransport};

/// Assertion helpers over a recorded transcript.
pub trait TranscriptAssertions {
    /// Get the recorded payloads.
    fn recorded(&self) -> Vec<Outbound>;

    /// Assert the message texts, in order.
    fn assert_messages(&self, expected: &[&str]) {
        let messages: Vec<String> = self
            .recorded()
            .iter()
            .filter_map(|p| p.as_response().map(|r| r.message.clone()))
            .collect();
        assert_eq!(messages, expected, "unexpected message sequence");
    }

    /// Assert every message was preceded by a typing on/off pair.
    fn assert_typing_pairs(&self) {
        let recorded = self.recorded();
        let mut pending: Vec<bool> = Vec::new();
        for payload in &recorded {
            match payload {
                Outbound::Typing { typing } => pending.push(*typing),
                Outbound::Message(response) => {
                    assert_eq!(
                        pending,
                        [true, false],
                        "message {:?} not preceded by typing on/off in {recorded:?}",
                        response.message
                    );
                    pending.clear();
                }
            }
        }
        assert!(pending.is_empty(), "dangling typing payloads in {recorded:?}");
    }

    /// Assert only the final message carries actions.
    fn assert_actions_only_on_last(&self) {
        let recorded = self.recorded();
        let responses: Vec<_> = recorded.iter().filter_map(Outbound::as_response).collect();
        if let Some((last, rest)) = responses.split_last() {
            assert!(
                rest.iter().all(|r| r.actions.is_none()),
                "actions attached before the last message in {recorded:?}"
            );
            assert!(last.actions.is_some(), "last message has no actions");
        }
    }

    /// Assert nothing was sent.
    fn assert_silent(&self) {
        let recorded = self.recorded();
        assert!(recorded.is_empty(), "expected no payloads, got {recorded:?}");
    }
}

impl TranscriptAssertions for RecordingTransport {
    fn recorded(&self) -> Vec<Outbound> {
        self.payloads().into_iter().map(|p| p.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::{Event, Response};

    #[tokio::test]
    async fn assertions_pass_on_well_formed_transcript() {
        let transport = RecordingTransport::new();
        let event = Event::new(transport.shared());
        for (text, last) in [("a", false), ("b", true)] {
            event.send(Outbound::typing(true)).await.unwrap();
            event.send(Outbound::typing(false)).await.unwrap();
            let mut response = Response::new(text);
            if last {
                response = response.with_actions(json!(["ok"]));
            }
            event.send(response).await.unwrap();
        }

        transport.assert_messages(&["a", "b"]);
        transport.assert_typing_pairs();
        transport.assert_actions_only_on_last();
    }

    #[tokio::test]
    #[should_panic(expected = "expected no payloads")]
    async fn silent_fails_when_something_was_sent() {
        let transport = RecordingTransport::new();
        let event = Event::new(transport.shared());
        event.reply("hi").await.unwrap();
        transport.assert_silent();
    }
}
