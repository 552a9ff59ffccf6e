// SPDX-License-Identifier: MIT
//! Global toast notification store.
//!
//! One toast is visible at a time; showing a new one replaces the old. Each
//! `show` bumps an epoch counter and spawns an auto-hide task keyed to that
//! epoch — a superseded task finds the epoch moved on and does nothing, so a
//! stale timer can never dismiss a newer toast.
//!
//! `hide` clears visibility but keeps the message text, so an exit animation
//! can still render it.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{ChangeBroadcaster, StoreEvent};

pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToastState {
    pub visible: bool,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl Default for ToastState {
    fn default() -> Self {
        Self {
            visible: false,
            message: String::new(),
            kind: ToastKind::Success,
            duration_ms: DEFAULT_TOAST_DURATION_MS,
        }
    }
}

/// Cheap-to-clone handle; all clones share the same toast.
#[derive(Clone)]
pub struct ToastStore {
    inner: Arc<ToastInner>,
}

struct ToastInner {
    state: RwLock<ToastState>,
    epoch: AtomicU64,
    notifier: ChangeBroadcaster,
}

impl ToastStore {
    pub fn new(notifier: ChangeBroadcaster) -> Self {
        Self {
            inner: Arc::new(ToastInner {
                state: RwLock::new(ToastState::default()),
                epoch: AtomicU64::new(0),
                notifier,
            }),
        }
    }

    pub async fn snapshot(&self) -> ToastState {
        self.inner.state.read().await.clone()
    }

    /// Show a toast, replacing any currently visible one and superseding its
    /// pending auto-hide timer.
    pub async fn show(&self, message: impl Into<String>, kind: ToastKind, duration_ms: u64) {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.inner.state.write().await;
            *state = ToastState {
                visible: true,
                message: message.into(),
                kind,
                duration_ms,
            };
        }
        self.inner.notifier.notify(StoreEvent::ToastChanged);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(duration_ms)).await;
            // Only the timer belonging to the latest `show` may dismiss.
            if inner.epoch.load(Ordering::SeqCst) != epoch {
                return;
            }
            let mut state = inner.state.write().await;
            if state.visible {
                state.visible = false;
                drop(state);
                inner.notifier.notify(StoreEvent::ToastChanged);
            }
        });
    }

    /// Mark the toast invisible. The message text is kept.
    pub async fn hide(&self) {
        let mut state = self.inner.state.write().await;
        if state.visible {
            state.visible = false;
            drop(state);
            self.inner.notifier.notify(StoreEvent::ToastChanged);
        }
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.show(message, ToastKind::Success, DEFAULT_TOAST_DURATION_MS)
            .await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.show(message, ToastKind::Error, DEFAULT_TOAST_DURATION_MS)
            .await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.show(message, ToastKind::Warning, DEFAULT_TOAST_DURATION_MS)
            .await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.show(message, ToastKind::Info, DEFAULT_TOAST_DURATION_MS)
            .await;
    }
}
