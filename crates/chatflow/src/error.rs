//! Error types for chatflow.
//!
//! This module defines all error types used throughout the library.
//! Every failure in playback or resume ends up as a [`FlowError`] returned
//! to the caller of the handler; nothing is swallowed except failed typing
//! indicators, which are logged.

use std::fmt;

use thiserror::Error;

/// Boxed error returned by user-supplied hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The lifecycle point at which a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before the first message is played.
    Before,
    /// After the last message was sent.
    After,
    /// When the user replies to an open dialog.
    OnResponse,
}

impl HookStage {
    /// Get the stage name as used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::OnResponse => "on_response",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for chatflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A dialog id was registered twice on the same manager.
    #[error("trying to add a dialog with id '{id}' but that id is already taken")]
    DuplicateDialog {
        /// The id that was already registered.
        id: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// An outbound payload could not be delivered.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A lifecycle hook reported a failure.
    #[error("{stage} hook of dialog '{dialog}' failed: {source}")]
    Hook {
        /// The dialog whose hook failed.
        dialog: String,
        /// Which hook failed.
        stage: HookStage,
        /// The error reported by the hook.
        #[source]
        source: BoxError,
    },

    /// A response hook panicked.
    #[error("on_response hook of dialog '{dialog}' panicked")]
    HookPanicked {
        /// The dialog whose hook panicked.
        dialog: String,
    },

    /// A handler in the router stack failed.
    #[error("handler error: {0}")]
    Handler(BoxError),

    /// An I/O error occurred while loading a script.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML script could not be parsed.
    #[error("invalid TOML script: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON script or payload could not be processed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regex trigger.
    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Errors reported by a [`Transport`](crate::event::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport refused or failed to deliver the payload.
    #[error("failed to deliver payload: {reason}")]
    Delivery {
        /// Why delivery failed.
        reason: String,
    },

    /// The underlying connection is gone.
    #[error("transport is closed")]
    Closed,

    /// The payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// An I/O error occurred while writing the payload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chatflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Create a duplicate dialog error.
    pub fn duplicate_dialog(id: impl Into<String>) -> Self {
        Self::DuplicateDialog { id: id.into() }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a hook error.
    pub fn hook(dialog: impl Into<String>, stage: HookStage, source: impl Into<BoxError>) -> Self {
        Self::Hook {
            dialog: dialog.into(),
            stage,
            source: source.into(),
        }
    }

    /// Create a handler error from any error or message.
    pub fn handler(source: impl Into<BoxError>) -> Self {
        Self::Handler(source.into())
    }

    /// Check if this error was raised at registration or load time.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateDialog { .. }
                | Self::Config { .. }
                | Self::Toml(_)
                | Self::Regex(_)
        )
    }

    /// Check if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this error came from a hook.
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        matches!(self, Self::Hook { .. } | Self::HookPanicked { .. })
    }

    /// Get the hook stage if this error came from a hook.
    #[must_use]
    pub const fn hook_stage(&self) -> Option<HookStage> {
        match self {
            Self::Hook { stage, .. } => Some(*stage),
            Self::HookPanicked { .. } => Some(HookStage::OnResponse),
            _ => None,
        }
    }
}

impl TransportError {
    /// Create a delivery error.
    pub fn delivery(reason: impl Into<String>) -> Self {
        Self::Delivery {
            reason: reason.into(),
        }
    }
}
