//! Minimal event router.
//!
//! The router runs an ordered stack of layers over one inbound event.
//! Middleware always runs; a route only runs when its matcher accepts the
//! event. A layer returning [`Flow::Continue`] hands the event to the next
//! layer, [`Flow::Halt`] ends processing, and an error ends processing and
//! is returned to the caller.

mod handler;
mod route;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use handler::{Flow, FnHandler, Handler, handler_fn};
pub use route::{Route, RouteMatcher, RouteOptions, RoutePredicate, RouteTest};

use crate::context::Context;
use crate::error::Result;
use crate::event::Event;

/// Router-wide options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterOptions {
    /// Default case sensitivity for routes that don't set their own.
    pub case_sensitive: bool,
}

impl RouterOptions {
    /// Create default router options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default case sensitivity.
    #[must_use]
    pub const fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }
}

/// One entry of the router stack.
#[derive(Clone)]
pub enum Layer {
    /// Runs for every event.
    Middleware(Arc<dyn Handler>),
    /// Runs when its matcher accepts the event.
    Route(Route),
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Middleware(_) => f.write_str("Middleware(..)"),
            Self::Route(route) => f.debug_tuple("Route").field(route).finish(),
        }
    }
}

/// An ordered stack of middleware and routes.
#[derive(Debug, Clone, Default)]
pub struct Router {
    stack: Vec<Layer>,
    options: RouterOptions,
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new(options: RouterOptions) -> Self {
        Self {
            stack: Vec::new(),
            options,
        }
    }

    /// Get the router options.
    #[must_use]
    pub const fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Append a route. Registration order is match priority.
    pub fn route(&mut self, route: Route) -> &mut Self {
        self.stack.push(Layer::Route(route));
        self
    }

    /// Append middleware.
    pub fn use_handler(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.stack.push(Layer::Middleware(Arc::new(handler)));
        self
    }

    /// Get the stack.
    #[must_use]
    pub fn stack(&self) -> &[Layer] {
        &self.stack
    }

    /// Get the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Run the stack over one event.
    pub async fn dispatch(&self, ctx: &mut Context, event: &Event) -> Result<Flow> {
        for (index, layer) in self.stack.iter().enumerate() {
            let flow = match layer {
                Layer::Middleware(handler) => handler.handle(ctx, event).await?,
                Layer::Route(route) => {
                    if !route.should_run(ctx, event) {
                        continue;
                    }
                    tracing::trace!(index, route = route.name(), "route matched");
                    route.handler().handle(ctx, event).await?
                }
            };
            if flow.is_halt() {
                tracing::trace!(index, "pipeline halted");
                return Ok(Flow::Halt);
            }
        }
        Ok(Flow::Continue)
    }
}

impl Handler for Router {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(self.dispatch(ctx, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowError;
    use crate::event::RecordingTransport;

    fn replying(text: &'static str, flow: Flow) -> Arc<dyn Handler> {
        Arc::new(handler_fn(move |_ctx, event| {
            Box::pin(async move {
                event.reply(text).await?;
                Ok::<_, FlowError>(flow)
            })
        }))
    }

    #[tokio::test]
    async fn first_matching_route_runs() {
        let transport = RecordingTransport::new();
        let mut router = Router::default();
        router
            .route(Route::new(RouteMatcher::new("bye", RouteOptions::new()), replying("see ya", Flow::Halt)))
            .route(Route::new(RouteMatcher::new("hi", RouteOptions::new()), replying("hello", Flow::Halt)))
            .route(Route::new(RouteMatcher::new(true, RouteOptions::new()), replying("fallback", Flow::Halt)));

        let mut ctx = Context::default();
        let flow = router
            .dispatch(&mut ctx, &Event::message("hi", transport.shared()))
            .await
            .unwrap();

        assert_eq!(flow, Flow::Halt);
        assert_eq!(transport.messages(), vec!["hello"]);
    }

    #[tokio::test]
    async fn continue_passes_to_later_layers() {
        let transport = RecordingTransport::new();
        let mut router = Router::default();
        router
            .use_handler(handler_fn(|ctx, _event| {
                Box::pin(async move {
                    ctx.locals.insert("logged".into(), true.into());
                    Ok::<_, FlowError>(Flow::Continue)
                })
            }))
            .route(Route::new(RouteMatcher::new(true, RouteOptions::new()), replying("one", Flow::Continue)))
            .route(Route::new(RouteMatcher::new(true, RouteOptions::new()), replying("two", Flow::Continue)));

        let mut ctx = Context::default();
        let flow = router
            .dispatch(&mut ctx, &Event::message("x", transport.shared()))
            .await
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(transport.messages(), vec!["one", "two"]);
        assert!(ctx.locals.contains_key("logged"));
    }

    #[tokio::test]
    async fn error_stops_the_stack() {
        let transport = RecordingTransport::new().failing_at(1);
        let mut router = Router::default();
        router
            .route(Route::new(RouteMatcher::new(true, RouteOptions::new()), replying("boom", Flow::Continue)))
            .route(Route::new(RouteMatcher::new(true, RouteOptions::new()), replying("never", Flow::Continue)));

        let mut ctx = Context::default();
        let err = router
            .dispatch(&mut ctx, &Event::message("x", transport.shared()))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(transport.messages().is_empty());
    }

    #[tokio::test]
    async fn unmatched_event_continues() {
        let transport = RecordingTransport::new();
        let mut router = Router::default();
        router.route(Route::new(RouteMatcher::new("hi", RouteOptions::new()), replying("hello", Flow::Halt)));

        let mut ctx = Context::default();
        let flow = router
            .dispatch(&mut ctx, &Event::message("what", transport.shared()))
            .await
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(transport.payloads().is_empty());
    }
}
