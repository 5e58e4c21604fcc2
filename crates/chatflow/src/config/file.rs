//! File-based dialog scripts.
//!
//! A script declares a manager's options and its dialogs in TOML or JSON:
//!
//! ```toml
//! namespace = "onboarding"
//!
//! [[dialog]]
//! id = "greet"
//! messages = ["Hi!", "Welcome aboard."]
//! trigger = { text = "hello" }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DialogConfig, ManagerConfig};
use crate::dialog::DialogOptions;
use crate::error::{FlowError, Result};
use crate::router::{RouteOptions, RouteTest};

/// Script file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ScriptFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// How a scripted dialog is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Exact text match.
    Text(String),
    /// Any of the keywords.
    Keywords(Vec<String>),
    /// Regular expression.
    Pattern(String),
    /// Always or never.
    Always(bool),
}

impl TriggerSpec {
    /// Build the route test.
    pub fn to_test(&self) -> Result<RouteTest> {
        Ok(match self {
            Self::Text(text) => RouteTest::Text(text.clone()),
            Self::Keywords(keywords) => RouteTest::keywords(keywords.iter().cloned()),
            Self::Pattern(pattern) => RouteTest::pattern(pattern)?,
            Self::Always(always) => RouteTest::from(*always),
        })
    }
}

/// One dialog declared in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogSpec {
    /// Dialog id, unique within the script.
    pub id: String,
    /// Messages, played in order.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Actions attached to the final message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
    /// Per-character delay override, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_delay_ms: Option<u64>,
    /// Cascade override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cascade: Option<bool>,
    /// Test-mode override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<bool>,
    /// Trigger; a dialog without one only plays when invoked directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSpec>,
    /// Case sensitivity of the trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl DialogSpec {
    /// Build dialog options on top of `defaults`.
    pub fn to_options(&self, defaults: &DialogConfig) -> Result<DialogOptions> {
        let mut config = defaults.clone();
        if let Some(ms) = self.character_delay_ms {
            config.character_delay = Duration::from_millis(ms);
        }
        if let Some(cascade) = self.cascade {
            config.cascade = cascade;
        }
        if let Some(test) = self.test {
            config.test = test;
        }

        let mut route_options = RouteOptions::new().name(self.id.clone());
        route_options.case_sensitive = self.case_sensitive;

        let mut options = DialogOptions::new(self.messages.iter().cloned())
            .config(config)
            .route_options(route_options);
        if let Some(actions) = &self.actions {
            options = options.actions(actions.clone());
        }
        if let Some(trigger) = &self.trigger {
            options = options.trigger(trigger.to_test()?);
        }
        Ok(options)
    }
}

/// A parsed dialog script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptFile {
    /// Manager namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Whether failed responses keep the dialog open.
    #[serde(default)]
    pub preserve_on_error: bool,
    /// Default case sensitivity of triggers.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Declared dialogs, in registration order.
    #[serde(default, rename = "dialog", alias = "dialogs")]
    pub dialogs: Vec<DialogSpec>,
}

impl ScriptFile {
    /// Parse script content.
    pub fn parse(content: &str, format: ScriptFormat) -> Result<Self> {
        let script: Self = match format {
            ScriptFormat::Toml => toml::from_str(content)?,
            ScriptFormat::Json => serde_json::from_str(content)?,
        };
        script.validate()?;
        Ok(script)
    }

    /// Load a script from a file, detecting the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ScriptFormat::from_path(path).ok_or_else(|| {
            FlowError::config(format!(
                "unsupported script format: {}",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), ?format, "loading dialog script");
        Self::parse(&content, format)
    }

    /// Check the script for problems that would fail at registration.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dialog in &self.dialogs {
            if dialog.id.is_empty() {
                return Err(FlowError::config("dialog id must not be empty"));
            }
            if !seen.insert(dialog.id.as_str()) {
                return Err(FlowError::duplicate_dialog(&dialog.id));
            }
        }
        Ok(())
    }

    /// Build the manager configuration.
    #[must_use]
    pub fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::new().preserve_on_error(self.preserve_on_error);
        config.namespace.clone_from(&self.namespace);
        config.router.case_sensitive = self.case_sensitive;
        config
    }

    /// Build options for every dialog, in declaration order.
    pub fn dialog_options(&self, defaults: &DialogConfig) -> Result<Vec<(String, DialogOptions)>> {
        self.dialogs
            .iter()
            .map(|spec| Ok((spec.id.clone(), spec.to_options(defaults)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOML_SCRIPT: &str = r#"
namespace = "support"
preserve_on_error = true

[[dialog]]
id = "greet"
messages = ["Hi!", "How can I help?"]
actions = ["Billing", "Other"]
trigger = { keywords = ["hello", "hi"] }

[[dialog]]
id = "bye"
messages = ["Bye!"]
character_delay_ms = 0
cascade = true
"#;

    #[test]
    fn format_detection() {
        assert_eq!(ScriptFormat::from_extension("TOML"), Some(ScriptFormat::Toml));
        assert_eq!(
            ScriptFormat::from_path(Path::new("bot/script.json")),
            Some(ScriptFormat::Json)
        );
        assert_eq!(ScriptFormat::from_path(Path::new("script.yaml")), None);
    }

    #[test]
    fn parse_toml() {
        let script = ScriptFile::parse(TOML_SCRIPT, ScriptFormat::Toml).unwrap();
        assert_eq!(script.namespace.as_deref(), Some("support"));
        assert!(script.preserve_on_error);
        assert_eq!(script.dialogs.len(), 2);
        assert_eq!(script.dialogs[0].actions, Some(json!(["Billing", "Other"])));
        assert_eq!(
            script.dialogs[0].trigger,
            Some(TriggerSpec::Keywords(vec!["hello".into(), "hi".into()]))
        );

        let config = script.manager_config();
        assert_eq!(config.namespace.as_deref(), Some("support"));
        assert!(config.preserve_on_error);
    }

    #[test]
    fn parse_json() {
        let script = ScriptFile::parse(
            r#"{ "dialogs": [{ "id": "a", "messages": ["x"], "trigger": { "pattern": "^a+$" } }] }"#,
            ScriptFormat::Json,
        )
        .unwrap();
        assert_eq!(script.dialogs[0].id, "a");
        assert!(script.namespace.is_none());
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let script = ScriptFile::parse(TOML_SCRIPT, ScriptFormat::Toml).unwrap();
        let options = script.dialog_options(&DialogConfig::default()).unwrap();

        let (id, greet) = &options[0];
        assert_eq!(id, "greet");
        assert_eq!(greet.config, DialogConfig::default());
        assert!(matches!(greet.trigger, RouteTest::Keywords(_)));
        assert_eq!(greet.route_options.name.as_deref(), Some("greet"));

        let (_, bye) = &options[1];
        assert_eq!(bye.config.character_delay, Duration::ZERO);
        assert!(bye.config.cascade);
        assert!(matches!(bye.trigger, RouteTest::Never));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = ScriptFile::parse(
            r#"
[[dialog]]
id = "a"
[[dialog]]
id = "a"
"#,
            ScriptFormat::Toml,
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateDialog { ref id } if id == "a"));
    }

    #[test]
    fn bad_pattern_surfaces_when_building() {
        let script = ScriptFile::parse(
            r#"{ "dialog": [{ "id": "a", "trigger": { "pattern": "(" } }] }"#,
            ScriptFormat::Json,
        )
        .unwrap();
        let err = script.dialog_options(&DialogConfig::default()).unwrap_err();
        assert!(matches!(err, FlowError::Regex(_)));
    }

    #[test]
    fn unsupported_extension() {
        let err = ScriptFile::load("script.yaml").unwrap_err();
        assert!(err.is_configuration());
    }
}
