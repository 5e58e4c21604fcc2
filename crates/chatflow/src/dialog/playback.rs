//! Dialog playback.
//!
//! Playback sends each message behind a typing indicator, waits a reading
//! delay between messages and carries the last reading delay over to the
//! next playback in the same session.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::Instrument;

use super::Dialog;
use crate::context::Context;
use crate::error::{HookStage, Result};
use crate::event::{Event, Outbound, Response};
use crate::router::{Flow, Handler};
use crate::session::OpenDialogMarker;

impl Dialog {
    /// Play the dialog for one event.
    ///
    /// Runs the `before` hook, sends every message, then completes: sets the
    /// open-dialog marker when the dialog awaits a reply, runs the `after`
    /// hook and returns [`Flow::Continue`] when cascading or [`Flow::Halt`]
    /// otherwise. A dialog without messages returns [`Flow::Continue`]
    /// without sending anything.
    ///
    /// # Errors
    ///
    /// Returns an error if a fallible hook fails or a message cannot be
    /// delivered. Remaining messages are not sent.
    pub async fn play(&self, ctx: &mut Context, event: &Event) -> Result<Flow> {
        let span = tracing::debug_span!(
            "dialog.play",
            dialog = %self.id,
            namespace = self.namespace.as_deref().unwrap_or_default(),
            messages = self.messages.len(),
        );
        async {
            self.metrics.playbacks_started.inc();
            let result = self.run(ctx, event).await;
            match &result {
                Ok(flow) => {
                    self.metrics.playbacks_completed.inc();
                    tracing::debug!(?flow, "playback finished");
                }
                Err(err) => {
                    self.metrics.playbacks_failed.inc();
                    tracing::debug!(error = %err, "playback aborted");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: &mut Context, event: &Event) -> Result<Flow> {
        if let Some(hook) = &self.before {
            hook.run(&self.id, HookStage::Before, ctx, event).await?;
        }
        self.play_inner(ctx, event, None).await
    }

    /// Play messages after `prev_index` (all of them for `None`).
    pub(crate) async fn play_inner(
        &self,
        ctx: &mut Context,
        event: &Event,
        prev_index: Option<usize>,
    ) -> Result<Flow> {
        if let Some(leftover) = ctx.session.take_leftover_delay() {
            tracing::trace!(?leftover, "waiting out previous reading delay");
            self.pause(leftover).await;
        }

        let start = prev_index.map_or(0, |i| i + 1);
        if start >= self.messages.len() {
            return Ok(Flow::Continue);
        }

        let last = self.messages.len() - 1;
        for (index, message) in self.messages.iter().enumerate().skip(start) {
            let is_last = index == last;
            let mut response = Response::new(message.as_str());
            if is_last {
                response.actions.clone_from(&self.actions);
            }

            let chars = message.chars().count();
            self.type_out(event, response, chars).await?;
            tracing::trace!(index, "message sent");

            let reading = self.config.reading_delay(chars);
            if is_last {
                ctx.session.set_leftover_delay(reading);
            } else {
                self.pause(reading).await;
            }
        }

        self.complete(ctx, event).await
    }

    /// Send one message behind a typing indicator.
    async fn type_out(&self, event: &Event, response: Response, chars: usize) -> Result<()> {
        self.indicate(event, true).await;
        self.pause(self.config.typing_delay(chars)).await;
        self.indicate(event, false).await;
        event.send(response).await?;
        self.metrics.messages_sent.inc();
        Ok(())
    }

    async fn indicate(&self, event: &Event, typing: bool) {
        if let Err(err) = event.send(Outbound::typing(typing)).await {
            tracing::warn!(dialog = %self.id, typing, error = %err, "typing indicator not delivered");
        }
    }

    async fn pause(&self, delay: Duration) {
        if self.config.test || delay.is_zero() {
            return;
        }
        tokio::time::sleep(delay).await;
    }

    async fn complete(&self, ctx: &mut Context, event: &Event) -> Result<Flow> {
        if self.on_response.is_some() {
            ctx.session.set_open_dialog(OpenDialogMarker::new(
                self.id.clone(),
                self.namespace.clone(),
            ));
            tracing::trace!("awaiting response");
        }
        if let Some(hook) = &self.after {
            hook.run(&self.id, HookStage::After, ctx, event).await?;
        }
        Ok(self.finish())
    }

    /// Map the cascade setting onto the pipeline flow.
    #[must_use]
    pub const fn finish(&self) -> Flow {
        if self.config.cascade {
            Flow::Continue
        } else {
            Flow::Halt
        }
    }
}

impl Handler for Dialog {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(self.play(ctx, event))
    }
}
