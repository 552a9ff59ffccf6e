pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod transport;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::info;

use client::ApiClient;
use config::ClientConfig;
use store::{ChangeBroadcaster, ConfirmStore, ProjectStore, StoreEvent, ToastStore};

/// Shared client state handed to every frontend consumer.
///
/// Constructed once at application start. The toast and confirm stores are
/// process-wide singletons only in the sense that one context holds one of
/// each — nothing lives in ambient globals, so tests can run isolated
/// contexts side by side and embedders control the lifecycle.
#[derive(Clone)]
pub struct ClientContext {
    pub config: Arc<ClientConfig>,
    pub api: Arc<ApiClient>,
    pub projects: Arc<ProjectStore>,
    pub toast: ToastStore,
    pub confirm: Arc<ConfirmStore>,
    pub broadcaster: ChangeBroadcaster,
}

impl ClientContext {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let broadcaster = ChangeBroadcaster::new();
        let api = Arc::new(ApiClient::new(&config)?);
        let projects = Arc::new(ProjectStore::new(api.clone(), broadcaster.clone()));
        let toast = ToastStore::new(broadcaster.clone());
        let confirm = Arc::new(ConfirmStore::new(broadcaster.clone()));

        info!(api_base_url = %config.api_base_url, "client context initialised");
        Ok(Self {
            config: Arc::new(config),
            api,
            projects,
            toast,
            confirm,
            broadcaster,
        })
    }

    /// Subscribe to store-change events. Receivers that fall behind see
    /// `Lagged` and should re-read the snapshots they care about.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.broadcaster.subscribe()
    }
}
