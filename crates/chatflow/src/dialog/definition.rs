//! Dialog definitions for scripted conversations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::config::DialogConfig;
use crate::context::Context;
use crate::error::{BoxError, FlowError, HookStage, Result};
use crate::event::Event;
use crate::metrics::DialogMetrics;
use crate::router::{Handler, RouteMatcher, RouteOptions, RouteTest};

/// Signature of a hook that cannot fail.
pub type SyncHookFn = Arc<dyn Fn(&mut Context, &Event) + Send + Sync>;

/// Signature of an async hook that may abort playback.
pub type FallibleHookFn = Arc<
    dyn for<'a> Fn(&'a mut Context, &'a Event) -> BoxFuture<'a, std::result::Result<(), BoxError>>
        + Send
        + Sync,
>;

/// A lifecycle hook run before or after playback.
#[derive(Clone)]
pub enum Hook {
    /// Runs inline and cannot abort playback.
    Sync(SyncHookFn),
    /// Runs asynchronously; an error aborts playback and is returned.
    Fallible(FallibleHookFn),
}

impl Hook {
    /// Create a hook that cannot fail.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&mut Context, &Event) + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Create an async hook that may fail.
    ///
    /// ```rust
    /// use chatflow::dialog::Hook;
    /// use chatflow::error::BoxError;
    ///
    /// let hook = Hook::fallible(|ctx, _event| {
    ///     Box::pin(async move {
    ///         if ctx.session.get("user_id").is_none() {
    ///             return Err("unknown user".into());
    ///         }
    ///         Ok::<_, BoxError>(())
    ///     })
    /// });
    /// assert!(hook.is_fallible());
    /// ```
    pub fn fallible<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, &'a Event) -> BoxFuture<'a, std::result::Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        Self::Fallible(Arc::new(f))
    }

    /// Check if the hook can abort playback.
    #[must_use]
    pub const fn is_fallible(&self) -> bool {
        matches!(self, Self::Fallible(_))
    }

    /// Run the hook, attributing failures to `dialog` at `stage`.
    pub(crate) async fn run(
        &self,
        dialog: &str,
        stage: HookStage,
        ctx: &mut Context,
        event: &Event,
    ) -> Result<()> {
        match self {
            Self::Sync(f) => {
                f(ctx, event);
                Ok(())
            }
            Self::Fallible(f) => f(ctx, event)
                .await
                .map_err(|source| FlowError::hook(dialog, stage, source)),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Hook::Sync(..)"),
            Self::Fallible(_) => f.write_str("Hook::Fallible(..)"),
        }
    }
}

/// Construction options for a [`Dialog`].
///
/// Only the messages are required; everything else has a default.
#[derive(Clone, Default)]
pub struct DialogOptions {
    /// Messages, played in order.
    pub messages: Vec<String>,
    /// Actions attached to the final message.
    pub actions: Option<Value>,
    /// Pacing and completion behavior.
    pub config: DialogConfig,
    /// Hook run before the first message.
    pub before: Option<Hook>,
    /// Hook run after the last message.
    pub after: Option<Hook>,
    /// Handler receiving the user's reply; makes the dialog wait for one.
    pub on_response: Option<Arc<dyn Handler>>,
    /// Test deciding whether an unmatched event starts this dialog.
    pub trigger: RouteTest,
    /// Options for the trigger.
    pub route_options: RouteOptions,
    /// Complete matcher; replaces `trigger` and `route_options` when set.
    pub route: Option<RouteMatcher>,
}

impl DialogOptions {
    /// Create options for a message script.
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Append a message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Attach actions to the final message.
    #[must_use]
    pub fn actions(mut self, actions: Value) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Replace the whole pacing configuration.
    #[must_use]
    pub const fn config(mut self, config: DialogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-character typing delay.
    #[must_use]
    pub const fn character_delay(mut self, delay: Duration) -> Self {
        self.config.character_delay = delay;
        self
    }

    /// Set whether completion continues the pipeline.
    #[must_use]
    pub const fn cascade(mut self, cascade: bool) -> Self {
        self.config.cascade = cascade;
        self
    }

    /// Set whether real delays are skipped.
    #[must_use]
    pub const fn test(mut self, test: bool) -> Self {
        self.config.test = test;
        self
    }

    /// Set the hook run before playback.
    #[must_use]
    pub fn before(mut self, hook: Hook) -> Self {
        self.before = Some(hook);
        self
    }

    /// Set the hook run after playback.
    #[must_use]
    pub fn after(mut self, hook: Hook) -> Self {
        self.after = Some(hook);
        self
    }

    /// Set the handler for the user's reply.
    #[must_use]
    pub fn on_response(mut self, handler: impl Handler + 'static) -> Self {
        self.on_response = Some(Arc::new(handler));
        self
    }

    /// Set the trigger test.
    #[must_use]
    pub fn trigger(mut self, test: impl Into<RouteTest>) -> Self {
        self.trigger = test.into();
        self
    }

    /// Set the trigger options.
    #[must_use]
    pub fn route_options(mut self, options: RouteOptions) -> Self {
        self.route_options = options;
        self
    }

    /// Set a complete matcher.
    #[must_use]
    pub fn route(mut self, matcher: RouteMatcher) -> Self {
        self.route = Some(matcher);
        self
    }
}

impl fmt::Debug for DialogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogOptions")
            .field("messages", &self.messages)
            .field("actions", &self.actions)
            .field("config", &self.config)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("on_response", &self.on_response.is_some())
            .field("trigger", &self.trigger)
            .field("route_options", &self.route_options)
            .field("route", &self.route)
            .finish()
    }
}

/// A scripted message sequence with lifecycle hooks and a trigger.
pub struct Dialog {
    pub(crate) id: String,
    pub(crate) namespace: Option<String>,
    pub(crate) messages: Vec<String>,
    pub(crate) actions: Option<Value>,
    pub(crate) config: DialogConfig,
    pub(crate) before: Option<Hook>,
    pub(crate) after: Option<Hook>,
    pub(crate) on_response: Option<Arc<dyn Handler>>,
    pub(crate) matcher: RouteMatcher,
    pub(crate) metrics: Arc<DialogMetrics>,
}

impl Dialog {
    /// Create a dialog from options.
    #[must_use]
    pub fn new(id: impl Into<String>, options: DialogOptions) -> Self {
        let matcher = options
            .route
            .unwrap_or_else(|| RouteMatcher::new(options.trigger, options.route_options));
        Self {
            id: id.into(),
            namespace: None,
            messages: options.messages,
            actions: options.actions,
            config: options.config,
            before: options.before,
            after: options.after,
            on_response: options.on_response,
            matcher,
            metrics: Arc::new(DialogMetrics::new()),
        }
    }

    /// Get the dialog id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the namespace of the owning manager.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get the messages.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the dialog has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the actions attached to the final message.
    #[must_use]
    pub const fn actions(&self) -> Option<&Value> {
        self.actions.as_ref()
    }

    /// Get the pacing configuration.
    #[must_use]
    pub const fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Get the route matcher.
    #[must_use]
    pub const fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    /// Check if the dialog waits for a reply after playback.
    #[must_use]
    pub const fn awaits_response(&self) -> bool {
        self.on_response.is_some()
    }

    /// Get the reply handler.
    #[must_use]
    pub fn response_handler(&self) -> Option<&Arc<dyn Handler>> {
        self.on_response.as_ref()
    }

    /// Check whether this dialog should start for an unmatched event.
    #[must_use]
    pub fn should_run(&self, ctx: &Context, event: &Event) -> bool {
        self.matcher.should_run(ctx, event)
    }

    /// Bind the dialog to a manager before it is shared.
    pub(crate) fn attach(
        &mut self,
        id: String,
        namespace: Option<String>,
        matcher: RouteMatcher,
        metrics: Arc<DialogMetrics>,
    ) {
        self.id = id;
        self.namespace = namespace;
        self.matcher = matcher;
        self.metrics = metrics;
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("messages", &self.messages)
            .field("actions", &self.actions)
            .field("config", &self.config)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("on_response", &self.on_response.is_some())
            .field("matcher", &self.matcher)
            .finish()
    }
}

impl From<(String, DialogOptions)> for Dialog {
    fn from((id, options): (String, DialogOptions)) -> Self {
        Self::new(id, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_defaults() {
        let options = DialogOptions::new(["hi"]);
        assert_eq!(options.messages, vec!["hi"]);
        assert_eq!(options.config, DialogConfig::default());
        assert!(options.before.is_none());
        assert!(options.on_response.is_none());
    }

    #[test]
    fn options_builder() {
        let options = DialogOptions::new(["hi"])
            .message("how are you?")
            .actions(json!(["good", "bad"]))
            .character_delay(Duration::ZERO)
            .cascade(true)
            .test(true)
            .trigger("hello");

        let dialog = Dialog::new("greet", options);
        assert_eq!(dialog.id(), "greet");
        assert_eq!(dialog.len(), 2);
        assert_eq!(dialog.actions(), Some(&json!(["good", "bad"])));
        assert!(dialog.config().cascade);
        assert!(dialog.config().test);
        assert!(!dialog.awaits_response());
        assert!(dialog.namespace().is_none());
    }

    #[test]
    fn explicit_route_wins_over_trigger() {
        let dialog = Dialog::new(
            "d",
            DialogOptions::new(["x"])
                .trigger("hello")
                .route(RouteMatcher::new("bye", RouteOptions::new().name("farewell"))),
        );
        assert_eq!(dialog.matcher().options.name.as_deref(), Some("farewell"));
        assert!(matches!(&dialog.matcher().test, RouteTest::Text(t) if t == "bye"));
    }

    #[test]
    fn hook_kinds() {
        assert!(!Hook::sync(|_ctx, _event| {}).is_fallible());
        assert!(
            Hook::fallible(|_ctx, _event| Box::pin(async { Ok::<_, BoxError>(()) })).is_fallible()
        );
    }

    #[test]
    fn empty_dialog() {
        let dialog = Dialog::new("empty", DialogOptions::default());
        assert!(dialog.is_empty());
        assert_eq!(dialog.len(), 0);
    }
}
