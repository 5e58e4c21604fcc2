//! Environment-based configuration.

use std::collections::HashMap;
use std::time::Duration;

use super::{DialogConfig, ManagerConfig};

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "CHATFLOW";

/// Variable names read by [`EnvConfig`], without the prefix.
pub mod vars {
    /// Per-character typing delay in milliseconds.
    pub const CHARACTER_DELAY_MS: &str = "CHARACTER_DELAY_MS";
    /// Whether dialogs cascade by default.
    pub const CASCADE: &str = "CASCADE";
    /// Whether real delays are skipped.
    pub const TEST: &str = "TEST";
    /// Manager namespace.
    pub const NAMESPACE: &str = "NAMESPACE";
    /// Whether failed responses keep the dialog open.
    pub const PRESERVE_ON_ERROR: &str = "PRESERVE_ON_ERROR";
    /// Whether route text matching is case sensitive.
    pub const CASE_SENSITIVE: &str = "CASE_SENSITIVE";
}

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Values consulted instead of the process environment.
    overrides: Option<HashMap<String, String>>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: None,
        }
    }

    /// Read from a fixed set of variables instead of the process environment.
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        match &self.overrides {
            Some(vars) => vars.get(&var_name).cloned(),
            None => std::env::var(&var_name).ok(),
        }
    }

    /// Get a parsed value.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a boolean with default.
    #[must_use]
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.bool(name).unwrap_or(default)
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Duration> {
        self.parse::<u64>(name).map(Duration::from_millis)
    }

    /// Build a dialog configuration, defaulting unset values.
    #[must_use]
    pub fn dialog_config(&self) -> DialogConfig {
        let defaults = DialogConfig::default();
        DialogConfig {
            character_delay: self
                .duration_millis(vars::CHARACTER_DELAY_MS)
                .unwrap_or(defaults.character_delay),
            cascade: self.bool_or(vars::CASCADE, defaults.cascade),
            test: self.bool_or(vars::TEST, defaults.test),
        }
    }

    /// Build a manager configuration, defaulting unset values.
    #[must_use]
    pub fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::new()
            .preserve_on_error(self.bool_or(vars::PRESERVE_ON_ERROR, false));
        config.router.case_sensitive = self.bool_or(vars::CASE_SENSITIVE, false);
        config.namespace = self.get(vars::NAMESPACE).filter(|ns| !ns.is_empty());
        config
    }
}
