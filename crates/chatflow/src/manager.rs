//! Dialog registry and reply dispatch.
//!
//! A [`DialogManager`] owns a set of dialogs and a [`Router`]. When the
//! session has an open dialog belonging to the manager, the next event is
//! handed to that dialog's response handler. Otherwise the event runs
//! through the router, where each dialog's trigger may start its playback.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::Instrument;

use crate::config::{DialogConfig, ManagerConfig, ScriptFile};
use crate::context::Context;
use crate::dialog::{Dialog, DialogOptions};
use crate::error::{FlowError, Result};
use crate::event::Event;
use crate::metrics::DialogMetrics;
use crate::router::{Flow, Handler, Route, Router};
use crate::session::OpenDialogMarker;

/// Anything [`DialogManager::add`] can register.
pub trait IntoDialog {
    /// Build the dialog registered under `id`.
    fn into_dialog(self, id: &str) -> Dialog;
}

impl IntoDialog for Dialog {
    fn into_dialog(self, _id: &str) -> Dialog {
        self
    }
}

impl IntoDialog for DialogOptions {
    fn into_dialog(self, id: &str) -> Dialog {
        Dialog::new(id, self)
    }
}

/// Registry of dialogs sharing one router.
pub struct DialogManager {
    config: ManagerConfig,
    dialogs: HashMap<String, Arc<Dialog>>,
    router: Router,
    metrics: Arc<DialogMetrics>,
}

impl Default for DialogManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl DialogManager {
    /// Create a manager.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        let router = Router::new(config.router.clone());
        Self {
            config,
            dialogs: HashMap::new(),
            router,
            metrics: Arc::new(DialogMetrics::new()),
        }
    }

    /// Create a manager with a namespace and default options.
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self::new(ManagerConfig::new().namespace(namespace))
    }

    /// Create a manager from a script file.
    ///
    /// Manager options come from the script; dialogs are built on top of
    /// `defaults` and registered in declaration order.
    pub fn from_script(path: impl AsRef<Path>, defaults: &DialogConfig) -> Result<Self> {
        Self::from_script_file(&ScriptFile::load(path)?, defaults)
    }

    /// Create a manager from an already parsed script.
    pub fn from_script_file(script: &ScriptFile, defaults: &DialogConfig) -> Result<Self> {
        let mut manager = Self::new(script.manager_config());
        for (id, options) in script.dialog_options(defaults)? {
            manager.add(id, options)?;
        }
        Ok(manager)
    }

    /// Register a dialog under `id` and append its route.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::DuplicateDialog`] if `id` is taken; the manager
    /// is left unchanged.
    pub fn add(&mut self, id: impl Into<String>, dialog: impl IntoDialog) -> Result<Arc<Dialog>> {
        let id = id.into();
        if self.dialogs.contains_key(&id) {
            return Err(FlowError::duplicate_dialog(id));
        }

        let mut dialog = dialog.into_dialog(&id);
        let matcher = dialog.matcher().clone().with_defaults(self.router.options());
        dialog.attach(
            id.clone(),
            self.config.namespace.clone(),
            matcher.clone(),
            Arc::clone(&self.metrics),
        );

        let dialog = Arc::new(dialog);
        self.router
            .route(Route::new(matcher, Arc::clone(&dialog) as Arc<dyn Handler>));
        self.dialogs.insert(id.clone(), Arc::clone(&dialog));
        tracing::debug!(dialog = %id, namespace = ?self.config.namespace, "dialog registered");
        Ok(dialog)
    }

    /// Append middleware to the router.
    pub fn use_handler(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.router.use_handler(handler);
        self
    }

    /// Process one event.
    ///
    /// A reply to an open dialog of this manager goes to that dialog's
    /// response handler; anything else runs through the router.
    pub async fn handle(&self, ctx: &mut Context, event: &Event) -> Result<Flow> {
        let Some(marker) = ctx.session.open_dialog() else {
            return self.router.dispatch(ctx, event).await;
        };
        if !marker.in_namespace(self.namespace()) {
            return self.router.dispatch(ctx, event).await;
        }
        let Some(dialog) = self.dialogs.get(&marker.dialog_id).cloned() else {
            tracing::trace!(dialog = %marker.dialog_id, "open dialog belongs to another manager");
            return Ok(Flow::Continue);
        };

        let span = tracing::debug_span!(
            "dialog.resume",
            dialog = %dialog.id(),
            namespace = self.namespace().unwrap_or_default(),
        );
        self.resume(&dialog, ctx, event).instrument(span).await
    }

    async fn resume(&self, dialog: &Dialog, ctx: &mut Context, event: &Event) -> Result<Flow> {
        let marker = OpenDialogMarker::new(dialog.id(), self.config.namespace.clone());
        ctx.session.clear_open_dialog();

        let Some(handler) = dialog.response_handler().cloned() else {
            tracing::warn!("open dialog has no response handler, marker dropped");
            return Ok(Flow::Continue);
        };

        self.metrics.resumes.inc();
        let outcome = AssertUnwindSafe(handler.handle(ctx, event))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(flow)) => {
                tracing::debug!(?flow, "response handled");
                Ok(flow)
            }
            Ok(Err(err)) => {
                self.metrics.resume_failures.inc();
                if self.config.preserve_on_error {
                    ctx.session.set_open_dialog(marker);
                }
                tracing::debug!(
                    error = %err,
                    preserved = self.config.preserve_on_error,
                    "response handler failed"
                );
                Err(err)
            }
            Err(_) => {
                self.metrics.resume_failures.inc();
                ctx.session.set_open_dialog(marker);
                tracing::warn!("response handler panicked, dialog kept open");
                Err(FlowError::HookPanicked {
                    dialog: dialog.id().to_string(),
                })
            }
        }
    }

    /// Get a registered dialog.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Dialog>> {
        self.dialogs.get(id)
    }

    /// Check if a dialog is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.dialogs.contains_key(id)
    }

    /// Get the number of registered dialogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    /// Check if no dialogs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Get the namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.config.namespace.as_deref()
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Get the underlying router.
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Get the metrics shared by this manager's dialogs.
    #[must_use]
    pub const fn metrics(&self) -> &Arc<DialogMetrics> {
        &self.metrics
    }

    /// Turn the manager into a shareable handler, e.g. to mount it on
    /// another router.
    #[must_use]
    pub fn into_handler(self) -> Arc<dyn Handler> {
        Arc::new(self)
    }
}

impl Handler for DialogManager {
    fn handle<'a>(&'a self, ctx: &'a mut Context, event: &'a Event) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(Self::handle(self, ctx, event))
    }
}

impl fmt::Debug for DialogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.dialogs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("DialogManager")
            .field("config", &self.config)
            .field("dialogs", &ids)
            .field("router", &self.router)
            .finish()
    }
}
