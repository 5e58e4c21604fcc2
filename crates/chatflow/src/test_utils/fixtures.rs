//! Dialog fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::dialog::DialogOptions;
use crate::error::{FlowError, Result};
use crate::event::Event;
use crate::router::{Flow, Handler};

/// Options for a dialog without delays.
#[must_use]
pub fn instant(messages: &[&str]) -> DialogOptions {
    DialogOptions::new(messages.iter().copied()).character_delay(Duration::ZERO)
}

/// The `greet` dialog: two messages, no delays, no reply expected.
#[must_use]
pub fn greet_options() -> DialogOptions {
    instant(&["hi", "how are you?"])
}

/// A one-question survey whose reply goes to `probe`.
#[must_use]
pub fn survey_options(probe: &ResponseProbe) -> DialogOptions {
    instant(&["How did we do?"]).on_response(probe.clone())
}

/// What a [`ResponseProbe`] does when called.
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    /// Reply with the text and return the flow.
    Reply(String, Flow),
    /// Fail with a handler error carrying the text.
    Fail(String),
    /// Panic.
    Panic,
}

#[derive(Debug)]
struct ProbeState {
    behavior: ProbeBehavior,
    calls: AtomicUsize,
    saw_marker: AtomicBool,
}

/// A response handler that records how it was called.
#[derive(Debug, Clone)]
pub struct ResponseProbe {
    state: Arc<ProbeState>,
}

impl ResponseProbe {
    /// Create a probe.
    #[must_use]
    pub fn new(behavior: ProbeBehavior) -> Self {
        Self {
            state: Arc::new(ProbeState {
                behavior,
                calls: AtomicUsize::new(0),
                saw_marker: AtomicBool::new(false),
            }),
        }
    }

    /// A probe that replies "thanks" and halts.
    #[must_use]
    pub fn thanking() -> Self {
        Self::new(ProbeBehavior::Reply("thanks".to_string(), Flow::Halt))
    }

    /// A probe that fails.
    #[must_use]
    pub fn failing() -> Self {
        Self::new(ProbeBehavior::Fail("response rejected".to_string()))
    }

    /// A probe that panics.
    #[must_use]
    pub fn panicking() -> Self {
        Self::new(ProbeBehavior::Panic)
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Whether an open-dialog marker was present during the last call.
    #[must_use]
    pub fn saw_marker(&self) -> bool {
        self.state.saw_marker.load(Ordering::SeqCst)
    }
}

impl Handler for ResponseProbe {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(async move {
            self.state.calls.fetch_add(1, Ordering::SeqCst);
            self.state
                .saw_marker
                .store(ctx.session.open_dialog().is_some(), Ordering::SeqCst);
            match &self.state.behavior {
                ProbeBehavior::Reply(text, flow) => {
                    event.reply(text.as_str()).await?;
                    Ok(*flow)
                }
                ProbeBehavior::Fail(message) => Err(FlowError::handler(message.clone())),
                ProbeBehavior::Panic => panic!("response probe panicked"),
            }
        })
    }
}
