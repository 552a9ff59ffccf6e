//! Verb-level API client.
//!
//! Composes the transport and the auth gate: every verb awaits
//! [`AuthGate::ensure_authenticated`] before dispatching, and transport
//! errors propagate unchanged. The dedicated [`ApiClient::login`] is the one
//! call that bypasses the gate — it performs the login itself and stores the
//! returned token directly.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::{AuthGate, AuthSession};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{Query, Transport};

pub struct ApiClient {
    transport: Arc<Transport>,
    gate: AuthGate,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let session = AuthSession::default();
        let transport = Arc::new(Transport::new(config, session.clone())?);
        let gate = AuthGate::new(
            transport.clone(),
            session,
            config.username.clone(),
            config.password.clone(),
        );
        Ok(Self { transport, gate })
    }

    // ─── Verbs ───────────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str, query: Query<'_>) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport.request(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport
            .request(Method::POST, path, &[], Some(body))
            .await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport
            .request(Method::PUT, path, &[], Some(body))
            .await
    }

    /// PUT with query parameters — a handful of backend routes (member role
    /// changes) take their payload this way.
    pub async fn put_query(&self, path: &str, query: Query<'_>) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport.request(Method::PUT, path, query, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport
            .request(Method::DELETE, path, &[], None)
            .await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.gate.ensure_authenticated().await?;
        self.transport
            .request(Method::PATCH, path, &[], Some(body))
            .await
    }

    // ─── Session administration ──────────────────────────────────────────────

    /// Log in with explicit credentials and store the resulting token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.gate.login(username, password).await
    }

    /// Drop the session and any in-flight login.
    pub async fn logout(&self) {
        self.gate.clear_token().await;
    }

    /// Install an externally-obtained token, bypassing the login flow.
    pub async fn set_auth_token(&self, token: impl Into<String>) {
        self.gate.set_token(token).await;
    }

    pub async fn clear_auth_token(&self) {
        self.gate.clear_token().await;
    }
}
