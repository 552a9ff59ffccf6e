// SPDX-License-Identifier: MIT
//! HTTP transport for the Flowdeck REST backend.
//!
//! One layer above reqwest: builds the final URL (base + path, query pairs
//! URL-encoded with absent values skipped), merges headers, parses every
//! response body as JSON, maps non-2xx statuses onto [`ApiError::Http`] and
//! connection-level failures onto [`ApiError::Network`], and unwraps the
//! backend's `{code, message, data}` envelope when present.
//!
//! The envelope-or-raw duality is a compatibility contract with the backend,
//! not an accident — some handlers wrap their payload, some do not.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Query pairs. `None` values are skipped, mirroring how the UI builds
/// requests with optional filters.
pub type Query<'a> = &'a [(&'a str, Option<&'a str>)];

pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    session: AuthSession,
}

impl Transport {
    pub fn new(config: &ClientConfig, session: AuthSession) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Dispatch a request and return the unwrapped JSON payload.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.request_with_headers(method, path, query, body, HeaderMap::new())
            .await
    }

    /// Like [`Transport::request`], with caller-supplied headers merged over
    /// the defaults. The `Authorization` header is attached last — callers
    /// can never override it.
    pub async fn request_with_headers(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&Value>,
        extra_headers: HeaderMap,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(extra_headers);
        if let Some(token) = self.session.token().await {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::network("auth token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let pairs: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|&(key, value)| value.map(|v| (key, v)))
            .collect();

        debug!(%method, path, "dispatching request");
        let mut request = self.http.request(method, &url).headers(headers);
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            // DNS, refused connection, timeout — no HTTP response exists.
            Err(e) => return Err(ApiError::network(e.to_string())),
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;
        let parsed: Option<Value> = if text.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str(&text).ok()
        };

        if !status.is_success() {
            return Err(http_error(status, parsed));
        }
        let Some(parsed) = parsed else {
            return Err(ApiError::network("response body is not valid JSON"));
        };
        Ok(unwrap_envelope(parsed))
    }
}

fn http_error(status: StatusCode, body: Option<Value>) -> ApiError {
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    ApiError::Http {
        status: status.as_u16(),
        message,
        body,
    }
}

/// `{code, message, data}` → `data`; anything else passes through untouched.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("code") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
