//! Global confirm-dialog store.
//!
//! Exactly one confirmation may be pending. `confirm` invokes the stored
//! callback at most once and clears the state; `cancel` clears without
//! invoking. Opening a new confirmation while one is pending replaces it —
//! the earlier caller's callback is dropped, which is why the replacement is
//! logged as a warning.

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::store::{ChangeBroadcaster, StoreEvent};

pub type ConfirmAction = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmVariant {
    #[default]
    Danger,
    Warning,
    Primary,
}

/// A pending confirmation. Build with [`ConfirmRequest::new`] and attach the
/// callback with [`ConfirmRequest::on_confirm`]:
///
/// ```rust,ignore
/// ctx.confirm
///     .open(
///         ConfirmRequest::new("Delete project", "This cannot be undone.")
///             .on_confirm(move || {
///                 let ctx = ctx.clone();
///                 tokio::spawn(async move {
///                     let _ = ctx.projects.delete_project(&id).await;
///                 });
///             }),
///     )
///     .await;
/// ```
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub variant: ConfirmVariant,
    pub on_confirm: Option<ConfirmAction>,
}

impl ConfirmRequest {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_text: "Confirm".into(),
            cancel_text: "Cancel".into(),
            variant: ConfirmVariant::default(),
            on_confirm: None,
        }
    }

    pub fn confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    pub fn cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    pub fn variant(mut self, variant: ConfirmVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn on_confirm(mut self, action: impl FnOnce() + Send + 'static) -> Self {
        self.on_confirm = Some(Box::new(action));
        self
    }
}

/// The dialog metadata a frontend renders — everything except the callback.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmMeta {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub variant: ConfirmVariant,
}

struct Pending {
    meta: ConfirmMeta,
    on_confirm: Option<ConfirmAction>,
}

pub struct ConfirmStore {
    pending: RwLock<Option<Pending>>,
    notifier: ChangeBroadcaster,
}

impl ConfirmStore {
    pub fn new(notifier: ChangeBroadcaster) -> Self {
        Self {
            pending: RwLock::new(None),
            notifier,
        }
    }

    pub async fn is_open(&self) -> bool {
        self.pending.read().await.is_some()
    }

    pub async fn snapshot(&self) -> Option<ConfirmMeta> {
        self.pending.read().await.as_ref().map(|p| p.meta.clone())
    }

    /// Store a pending confirmation, replacing any existing one.
    pub async fn open(&self, request: ConfirmRequest) {
        let meta = ConfirmMeta {
            title: request.title,
            message: request.message,
            confirm_text: request.confirm_text,
            cancel_text: request.cancel_text,
            variant: request.variant,
        };
        let mut pending = self.pending.write().await;
        if let Some(old) = pending.as_ref() {
            // The earlier caller's callback is silently dropped here — worth
            // knowing about when two flows race for the dialog.
            warn!(
                replaced = %old.meta.title,
                by = %meta.title,
                "replacing a pending confirmation"
            );
        }
        *pending = Some(Pending {
            meta,
            on_confirm: request.on_confirm,
        });
        drop(pending);
        self.notifier.notify(StoreEvent::ConfirmChanged);
    }

    /// Invoke the stored callback (at most once) and clear the dialog.
    pub async fn confirm(&self) {
        let taken = self.pending.write().await.take();
        self.notifier.notify(StoreEvent::ConfirmChanged);
        // Run outside the lock — the callback may call back into stores.
        if let Some(action) = taken.and_then(|p| p.on_confirm) {
            action();
        }
    }

    /// Clear the dialog without invoking the callback.
    pub async fn cancel(&self) {
        let taken = self.pending.write().await.take();
        if taken.is_some() {
            self.notifier.notify(StoreEvent::ConfirmChanged);
        }
    }
}
