//! chatflow: Scripted dialogs for conversational routers
//!
//! This crate plays linear message scripts with simulated typing delays and
//! resumes a conversation when the user answers an open question.
//!
//! # Features
//!
//! - **Async-first design** with Tokio timers for typing and reading delays
//! - **Resumable dialogs**: a dialog with a response handler stays open in
//!   the session until the next reply
//! - **Namespaced managers** sharing one session without stealing replies
//! - **Flexible triggers** with text, keyword, regex and custom predicates
//! - **Script files** in TOML or JSON
//! - **Recording transport** for tests and local harnesses
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use chatflow::prelude::*;
//!
//! # async fn demo() -> chatflow::Result<()> {
//! let mut manager = DialogManager::default();
//! manager.add(
//!     "greet",
//!     DialogOptions::new(["hi", "how are you?"])
//!         .character_delay(Duration::ZERO)
//!         .trigger("hello"),
//! )?;
//!
//! let transport = RecordingTransport::new();
//! let mut ctx = Context::default();
//! manager
//!     .handle(&mut ctx, &Event::message("hello", transport.shared()))
//!     .await?;
//! assert_eq!(transport.messages(), ["hi", "how are you?"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dialog;
pub mod error;
pub mod event;
pub mod manager;
pub mod metrics;
pub mod prelude;
pub mod router;
pub mod session;

pub use config::{DialogConfig, EnvConfig, ManagerConfig, ScriptFile};
pub use context::Context;
pub use dialog::{Dialog, DialogOptions, Hook};
pub use error::{BoxError, FlowError, HookStage, Result, TransportError};
pub use event::{Event, Outbound, RecordingTransport, Response, Transport};
pub use manager::{DialogManager, IntoDialog};
pub use metrics::{Counter, DialogMetrics, MetricsSnapshot};
pub use router::{
    Flow, Handler, Route, RouteMatcher, RouteOptions, RouteTest, Router, RouterOptions,
    handler_fn,
};
pub use session::{OpenDialogMarker, Session};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::{ProbeBehavior, ResponseProbe, TranscriptAssertions};
