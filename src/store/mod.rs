//! Reactive state stores.
//!
//! Each store owns its slice of application state behind an async lock,
//! mutates it only through its own actions, and hands the UI cloneable
//! snapshots. Every mutation ends with a [`ChangeBroadcaster::notify`] so
//! subscribed frontends know to re-read.

pub mod confirm;
pub mod projects;
pub mod toast;

pub use confirm::{ConfirmRequest, ConfirmStore, ConfirmVariant};
pub use projects::{FormState, ProjectStore, ProjectsState, SortKey, SortSpec, StatusFilter};
pub use toast::{ToastKind, ToastState, ToastStore};

use tokio::sync::broadcast;

/// Which store changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ProjectsChanged,
    ToastChanged,
    ConfirmChanged,
}

/// Fans change notifications out to every subscribed frontend.
#[derive(Clone)]
pub struct ChangeBroadcaster {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Notify subscribers of a change. No subscribers is fine.
    pub fn notify(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
