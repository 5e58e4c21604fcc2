//! Console harness for dialog scripts.
//!
//! Usage: `console-bot <script.toml|script.json>`
//!
//! Every stdin line is one inbound message. Outbound payloads are printed to
//! stdout as JSON lines; logs go to stderr (filtered by `RUST_LOG`). Delays
//! and defaults follow the `CHATFLOW_*` environment variables.

use std::io::Write;

use chatflow::{
    Context, DialogConfig, DialogManager, Event, FlowError, Outbound, Transport, TransportError,
};
use futures::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Writes each payload to stdout as one JSON line.
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&self, payload: Outbound) -> BoxFuture<'_, Result<(), TransportError>> {
        let result = write_line(&payload);
        Box::pin(async move { result })
    }
}

fn write_line(payload: &Outbound) -> Result<(), TransportError> {
    let line = serde_json::to_string(payload)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> chatflow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatflow=info,console_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| FlowError::config("usage: console-bot <script.toml|script.json>"))?;
    let manager = DialogManager::from_script(&path, &DialogConfig::from_env())?;
    tracing::info!(script = %path, dialogs = manager.len(), "script loaded");

    let transport: std::sync::Arc<dyn Transport> = std::sync::Arc::new(StdoutTransport);
    let mut ctx = Context::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        ctx.locals.clear();
        let event = Event::message(text, std::sync::Arc::clone(&transport));
        match manager.handle(&mut ctx, &event).await {
            Ok(flow) => tracing::debug!(?flow, "turn complete"),
            Err(err) => tracing::error!(error = %err, "turn failed"),
        }

        if let Ok(session) = serde_json::to_string(&ctx.session) {
            tracing::debug!(%session, "session state");
        }
    }

    let snapshot = manager.metrics().snapshot();
    tracing::info!(
        playbacks = snapshot.playbacks_completed,
        messages = snapshot.messages_sent,
        resumes = snapshot.resumes,
        "input closed"
    );
    Ok(())
}
