//! The handler contract shared by middleware, routes, dialogs and managers.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::Result;
use crate::event::Event;

/// What the pipeline should do after a handler completed successfully.
///
/// An `Err` from a handler stops the pipeline and carries the failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing the same event with the next layer.
    #[default]
    Continue,
    /// The event is fully handled; no further layer runs.
    Halt,
}

impl Flow {
    /// Check if processing should stop.
    #[must_use]
    pub const fn is_halt(self) -> bool {
        matches!(self, Self::Halt)
    }
}

/// Something that processes an inbound event.
pub trait Handler: Send + Sync {
    /// Process one event.
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        (**self).handle(ctx, event)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        (**self).handle(ctx, event)
    }
}

/// A handler backed by a closure. Created with [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, &'a Event) -> BoxFuture<'a, Result<Flow>> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        (self.f)(ctx, event)
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`Handler`].
///
/// # Example
///
/// ```rust
/// use chatflow::FlowError;
/// use chatflow::router::{Flow, handler_fn};
///
/// let greet = handler_fn(|_ctx, event| {
///     Box::pin(async move {
///         event.reply("hello!").await?;
///         Ok::<_, FlowError>(Flow::Halt)
///     })
/// });
/// # let _ = greet;
/// ```
pub const fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, &'a Event) -> BoxFuture<'a, Result<Flow>> + Send + Sync,
{
    FnHandler { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingTransport;

    #[tokio::test]
    async fn fn_handler_runs_closure() {
        let transport = RecordingTransport::new();
        let handler = handler_fn(|ctx, event| {
            Box::pin(async move {
                ctx.locals.insert("seen".into(), true.into());
                event.reply("pong").await?;
                Ok::<_, crate::FlowError>(Flow::Halt)
            })
        });

        let mut ctx = Context::default();
        let event = Event::message("ping", transport.shared());
        let flow = handler.handle(&mut ctx, &event).await.unwrap();

        assert_eq!(flow, Flow::Halt);
        assert_eq!(ctx.locals.get("seen"), Some(&true.into()));
        assert_eq!(transport.messages(), vec!["pong"]);
    }

    #[test]
    fn flow_default_continues() {
        assert!(!Flow::default().is_halt());
        assert!(Flow::Halt.is_halt());
    }
}
