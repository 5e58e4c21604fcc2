//! Convenient re-exports for common chatflow usage.
//!
//! ```rust
//! use chatflow::prelude::*;
//!
//! let manager = DialogManager::namespaced("onboarding");
//! assert_eq!(manager.namespace(), Some("onboarding"));
//! ```

// Configuration
pub use crate::config::{DialogConfig, ManagerConfig};

// Error handling
pub use crate::error::{FlowError, Result};

// Dialogs
pub use crate::dialog::{Dialog, DialogOptions, Hook};
pub use crate::manager::DialogManager;

// Events and state
pub use crate::context::Context;
pub use crate::event::{Event, Outbound, RecordingTransport, Response, Transport};
pub use crate::session::Session;

// Routing
pub use crate::router::{Flow, Handler, RouteOptions, RouteTest, Router, handler_fn};
