//! Configuration types for chatflow.
//!
//! This module defines configuration structures for dialog pacing and
//! manager dispatch, plus loaders for environment variables and script
//! files.

pub mod env;
pub mod file;

use std::time::Duration;

use crate::router::RouterOptions;

pub use env::EnvConfig;
pub use file::{ScriptFile, ScriptFormat, TriggerSpec, DialogSpec};

/// Default simulated typing time per character (30 ms).
pub const DEFAULT_CHARACTER_DELAY: Duration = Duration::from_millis(30);

/// Pacing and completion behavior of a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogConfig {
    /// Simulated typing time per character of a message.
    pub character_delay: Duration,

    /// Whether a finished dialog lets the pipeline keep processing the event.
    pub cascade: bool,

    /// Skip real delays (playback still computes and records them).
    pub test: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            character_delay: DEFAULT_CHARACTER_DELAY,
            cascade: false,
            test: false,
        }
    }
}

impl DialogConfig {
    /// Create the default dialog configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `CHATFLOW_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        EnvConfig::default().dialog_config()
    }

    /// Set the per-character delay.
    #[must_use]
    pub const fn character_delay(mut self, delay: Duration) -> Self {
        self.character_delay = delay;
        self
    }

    /// Set whether completion continues the pipeline.
    #[must_use]
    pub const fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Set whether real delays are skipped.
    #[must_use]
    pub const fn test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Time spent "typing" a message of `chars` characters.
    #[must_use]
    pub fn typing_delay(&self, chars: usize) -> Duration {
        self.character_delay
            .saturating_mul(u32::try_from(chars).unwrap_or(u32::MAX))
    }

    /// Time a reader spends on a message of `chars` characters.
    #[must_use]
    pub fn reading_delay(&self, chars: usize) -> Duration {
        self.typing_delay(chars) / 2
    }
}

/// Configuration of a dialog manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Namespace distinguishing managers that share one session.
    pub namespace: Option<String>,

    /// Restore the open-dialog marker when a response hook fails.
    pub preserve_on_error: bool,

    /// Options of the underlying router.
    pub router: RouterOptions,
}

impl ManagerConfig {
    /// Create the default manager configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `CHATFLOW_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        EnvConfig::default().manager_config()
    }

    /// Set the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set whether failed responses keep the dialog open.
    #[must_use]
    pub const fn preserve_on_error(mut self, preserve: bool) -> Self {
        self.preserve_on_error = preserve;
        self
    }

    /// Set the router options.
    #[must_use]
    pub fn router(mut self, router: RouterOptions) -> Self {
        self.router = router;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_config_defaults() {
        let config = DialogConfig::default();
        assert_eq!(config.character_delay, Duration::from_millis(30));
        assert!(!config.cascade);
        assert!(!config.test);
    }

    #[test]
    fn delays_scale_with_length() {
        let config = DialogConfig::new().character_delay(Duration::from_millis(10));
        assert_eq!(config.typing_delay(12), Duration::from_millis(120));
        assert_eq!(config.reading_delay(12), Duration::from_millis(60));
        assert_eq!(config.typing_delay(0), Duration::ZERO);
    }

    #[test]
    fn zero_delay_config() {
        let config = DialogConfig::new().character_delay(Duration::ZERO);
        assert_eq!(config.typing_delay(500), Duration::ZERO);
        assert_eq!(config.reading_delay(500), Duration::ZERO);
    }

    #[test]
    fn manager_config_builder() {
        let config = ManagerConfig::new()
            .namespace("onboarding")
            .preserve_on_error(true)
            .router(RouterOptions::new().case_sensitive(true));

        assert_eq!(config.namespace.as_deref(), Some("onboarding"));
        assert!(config.preserve_on_error);
        assert!(config.router.case_sensitive);
    }
}
