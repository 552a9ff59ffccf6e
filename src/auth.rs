// SPDX-License-Identifier: MIT
//! Bearer-token lifecycle and the single-flight login gate.
//!
//! Every authenticated call funnels through [`AuthGate::ensure_authenticated`].
//! When no token exists yet, the first caller installs a shared login future
//! in the pending slot *before any await point*; every caller that arrives
//! while it is in flight awaits the same future. A burst of N concurrent
//! calls therefore produces exactly one `POST /auth/login` on the wire, and
//! all N observe the same outcome — success or failure.
//!
//! The pending slot is cleared when the login resolves, on failure too, so a
//! later call can retry instead of awaiting a dead future forever.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::transport::Transport;

// ─── Session token ───────────────────────────────────────────────────────────

/// Shared bearer-token slot.
///
/// Cloned into the transport for header injection; the gate owns its
/// lifecycle.
#[derive(Clone, Default)]
pub struct AuthSession {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthSession {
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

// ─── Single-flight gate ──────────────────────────────────────────────────────

type LoginFuture = Shared<BoxFuture<'static, Result<String, ApiError>>>;

pub struct AuthGate {
    transport: Arc<Transport>,
    session: AuthSession,
    username: String,
    password: String,
    pending: Arc<Mutex<Option<LoginFuture>>>,
}

impl AuthGate {
    pub fn new(
        transport: Arc<Transport>,
        session: AuthSession,
        username: String,
        password: String,
    ) -> Self {
        Self {
            transport,
            session,
            username,
            password,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Make sure a bearer token exists, logging in lazily if needed.
    pub async fn ensure_authenticated(&self) -> Result<(), ApiError> {
        if self.session.is_authenticated().await {
            return Ok(());
        }

        let login = {
            let mut pending = self.pending.lock().await;
            // Re-check under the lock — a login may have completed while we
            // waited for it.
            if self.session.is_authenticated().await {
                return Ok(());
            }
            match pending.as_ref() {
                Some(login) => login.clone(),
                None => {
                    let login = login_future(
                        self.transport.clone(),
                        self.session.clone(),
                        self.pending.clone(),
                        self.username.clone(),
                        self.password.clone(),
                    );
                    *pending = Some(login.clone());
                    login
                }
            }
        };

        login.await.map(|_| ())
    }

    /// Explicit login with caller-supplied credentials — bypasses the gate
    /// and replaces the stored session on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let token = perform_login(&self.transport, username, password).await?;
        self.session.set(token).await;
        info!("login succeeded — session established");
        Ok(())
    }

    /// Install a token for an externally-managed session without logging in.
    pub async fn set_token(&self, token: impl Into<String>) {
        self.session.set(token).await;
    }

    /// Drop the session. Also forgets any in-flight login so the next call
    /// starts fresh.
    pub async fn clear_token(&self) {
        self.session.clear().await;
        *self.pending.lock().await = None;
    }
}

fn login_future(
    transport: Arc<Transport>,
    session: AuthSession,
    pending: Arc<Mutex<Option<LoginFuture>>>,
    username: String,
    password: String,
) -> LoginFuture {
    async move {
        let result = perform_login(&transport, &username, &password).await;
        match &result {
            // Store the token before releasing the pending slot, so a caller
            // arriving in between takes the fast path instead of starting a
            // second login.
            Ok(token) => {
                session.set(token.clone()).await;
                info!("login succeeded — session established");
            }
            Err(e) => warn!(status = e.status(), "login failed: {e}"),
        }
        *pending.lock().await = None;
        result
    }
    .boxed()
    .shared()
}

async fn perform_login(
    transport: &Transport,
    username: &str,
    password: &str,
) -> Result<String, ApiError> {
    let payload = json!({ "username": username, "password": password });
    let data = transport
        .request(Method::POST, "/auth/login", &[], Some(&payload))
        .await?;
    token_from_login(&data)
}

fn token_from_login(data: &Value) -> Result<String, ApiError> {
    data.get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::network("login response is missing the token field"))
}
