//! Routes: a match predicate bound to a handler.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::RouterOptions;
use super::handler::Handler;
use crate::context::Context;
use crate::event::Event;

/// Predicate type for custom route tests.
pub type RoutePredicate = Arc<dyn Fn(&Context, &Event) -> bool + Send + Sync>;

/// Decides whether an inbound event matches a route.
#[derive(Clone, Default)]
pub enum RouteTest {
    /// Never matches; the handler only runs when invoked directly.
    #[default]
    Never,
    /// Matches every event.
    Always,
    /// Matches when the event text equals this text (surrounding whitespace ignored).
    Text(String),
    /// Matches when the event text contains any of these keywords.
    Keywords(Vec<String>),
    /// Matches when the regex matches the event text.
    Pattern(Regex),
    /// Matches when the predicate returns true.
    Custom(RoutePredicate),
}

impl RouteTest {
    /// Create a custom predicate test.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Context, &Event) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Create a regex test.
    pub fn pattern(pattern: &str) -> crate::Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Create a keyword test.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keywords(keywords.into_iter().map(Into::into).collect())
    }

    /// Evaluate the test.
    #[must_use]
    pub fn matches(&self, ctx: &Context, event: &Event, case_sensitive: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Custom(predicate) => predicate(ctx, event),
            Self::Pattern(regex) => event.text().is_some_and(|text| regex.is_match(text)),
            Self::Text(expected) => event.text().is_some_and(|text| {
                let text = text.trim();
                if case_sensitive {
                    text == expected.as_str()
                } else {
                    text.to_lowercase() == expected.to_lowercase()
                }
            }),
            Self::Keywords(keywords) => event.text().is_some_and(|text| {
                if case_sensitive {
                    keywords.iter().any(|k| text.contains(k.as_str()))
                } else {
                    let text = text.to_lowercase();
                    keywords.iter().any(|k| text.contains(&k.to_lowercase()))
                }
            }),
        }
    }
}

impl fmt::Debug for RouteTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Always => f.write_str("Always"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Keywords(keywords) => f.debug_tuple("Keywords").field(keywords).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<bool> for RouteTest {
    fn from(always: bool) -> Self {
        if always { Self::Always } else { Self::Never }
    }
}

impl From<&str> for RouteTest {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RouteTest {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Regex> for RouteTest {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Per-route options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Name used in logs.
    pub name: Option<String>,
    /// Whether text and keyword tests are case sensitive.
    ///
    /// `None` inherits the router default.
    pub case_sensitive: Option<bool>,
}

impl RouteOptions {
    /// Create default route options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set case sensitivity.
    #[must_use]
    pub const fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }
}

/// A route test together with its options.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    /// The test to evaluate.
    pub test: RouteTest,
    /// Options applied while testing.
    pub options: RouteOptions,
}

impl RouteMatcher {
    /// Create a matcher.
    pub fn new(test: impl Into<RouteTest>, options: RouteOptions) -> Self {
        Self {
            test: test.into(),
            options,
        }
    }

    /// Fill unset options from the router defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &RouterOptions) -> Self {
        if self.options.case_sensitive.is_none() {
            self.options.case_sensitive = Some(defaults.case_sensitive);
        }
        self
    }

    /// Check whether the event matches.
    #[must_use]
    pub fn should_run(&self, ctx: &Context, event: &Event) -> bool {
        self.test
            .matches(ctx, event, self.options.case_sensitive.unwrap_or(false))
    }
}

/// A matcher bound to the handler it starts.
#[derive(Clone)]
pub struct Route {
    matcher: RouteMatcher,
    handler: Arc<dyn Handler>,
}

impl Route {
    /// Create a route.
    pub fn new(matcher: RouteMatcher, handler: Arc<dyn Handler>) -> Self {
        Self { matcher, handler }
    }

    /// Get the matcher.
    #[must_use]
    pub const fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    /// Get the route name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.matcher.options.name.as_deref()
    }

    /// Get the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Check whether this route should handle the event.
    #[must_use]
    pub fn should_run(&self, ctx: &Context, event: &Event) -> bool {
        self.matcher.should_run(ctx, event)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("matcher", &self.matcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingTransport;

    fn event(text: &str) -> Event {
        Event::message(text, RecordingTransport::new().shared())
    }

    #[test]
    fn text_test_ignores_case_and_whitespace() {
        let ctx = Context::default();
        let test = RouteTest::from("hello");
        assert!(test.matches(&ctx, &event("  Hello "), false));
        assert!(!test.matches(&ctx, &event("Hello"), true));
        assert!(!test.matches(&ctx, &event("hello there"), false));
    }

    #[test]
    fn keyword_test() {
        let ctx = Context::default();
        let test = RouteTest::keywords(["help", "support"]);
        assert!(test.matches(&ctx, &event("I need HELP"), false));
        assert!(!test.matches(&ctx, &event("I need HELP"), true));
        assert!(!test.matches(&ctx, &event("thanks"), false));
    }

    #[test]
    fn pattern_test() {
        let ctx = Context::default();
        let test = RouteTest::pattern(r"^order #\d+$").unwrap();
        assert!(test.matches(&ctx, &event("order #42"), false));
        assert!(!test.matches(&ctx, &event("order #x"), false));
        assert!(RouteTest::pattern("(").is_err());
    }

    #[test]
    fn never_and_always() {
        let ctx = Context::default();
        assert!(!RouteTest::from(false).matches(&ctx, &event("x"), false));
        assert!(RouteTest::from(true).matches(&ctx, &event("x"), false));
        let empty = Event::new(RecordingTransport::new().shared());
        assert!(!RouteTest::default().matches(&ctx, &empty, false));
    }

    #[test]
    fn custom_test_sees_session() {
        let mut ctx = Context::default();
        let test = RouteTest::custom(|ctx, _event| ctx.session.get("vip").is_some());
        assert!(!test.matches(&ctx, &event("x"), false));
        ctx.session.insert("vip", true);
        assert!(test.matches(&ctx, &event("x"), false));
    }

    #[test]
    fn matcher_inherits_router_case_default() {
        let strict = RouterOptions::new().case_sensitive(true);
        let matcher = RouteMatcher::new("Hi", RouteOptions::new()).with_defaults(&strict);
        assert_eq!(matcher.options.case_sensitive, Some(true));

        let ctx = Context::default();
        assert!(!matcher.should_run(&ctx, &event("hi")));
        assert!(matcher.should_run(&ctx, &event("Hi")));

        let explicit = RouteMatcher::new("Hi", RouteOptions::new().case_sensitive(false))
            .with_defaults(&strict);
        assert!(explicit.should_run(&ctx, &event("hi")));
    }
}
