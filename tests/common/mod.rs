//! In-process mock of the Flowdeck REST backend for integration tests.
//!
//! Binds to a random loopback port, keeps its project collection in memory,
//! and counts login/list calls so tests can assert on wire traffic. Some
//! endpoints answer enveloped and some bare, matching the real backend's
//! inconsistency.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "mock-token-1";

/// Honor RUST_LOG in test runs; repeated calls are fine.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct MockState {
    pub login_calls: AtomicUsize,
    /// Hits on GET /projects (list only).
    pub list_calls: AtomicUsize,
    pub fail_login: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    /// When set, GET /projects?status=planning answers this much later.
    pub slow_planning_ms: AtomicU64,
    pub projects: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
}

pub struct MockBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

pub async fn spawn() -> MockBackend {
    spawn_with(Vec::new()).await
}

pub async fn spawn_with(seed: Vec<Value>) -> MockBackend {
    init_tracing();
    let state = Arc::new(MockState {
        projects: Mutex::new(seed),
        next_id: AtomicUsize::new(100),
        ..Default::default()
    });

    let router = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/members", post(add_members))
        .route(
            "/api/projects/{id}/members/{user}",
            axum::routing::delete(remove_member),
        )
        .route(
            "/api/projects/{id}/members/{user}/role",
            axum::routing::put(change_role),
        )
        .route("/api/projects/users/search", get(search_users))
        .route("/api/projects/members/available", post(available_members))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend {
        state,
        base_url: format!("http://{addr}/api"),
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "unauthorized" })),
    )
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    // Widen the race window a little so bursts genuinely overlap.
    tokio::time::sleep(Duration::from_millis(20)).await;

    if state.fail_login.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "login unavailable" })),
        ));
    }
    if body.get("username").and_then(Value::as_str).is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "username required" })),
        ));
    }
    Ok(Json(
        json!({ "code": 0, "message": "ok", "data": { "token": TOKEN } }),
    ))
}

async fn list_projects(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    state.list_calls.fetch_add(1, Ordering::SeqCst);

    if params.get("status").map(String::as_str) == Some("planning") {
        let delay = state.slow_planning_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    let projects = state.projects.lock().unwrap().clone();
    let filtered: Vec<Value> = projects
        .into_iter()
        .filter(|p| match params.get("status") {
            Some(s) => p.get("status").and_then(Value::as_str) == Some(s.as_str()),
            None => true,
        })
        .collect();
    Ok(Json(json!({ "code": 0, "message": "ok", "data": filtered })))
}

async fn create_project(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    if state.fail_create.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "create failed" })),
        ));
    }

    let id = format!("p{}", state.next_id.fetch_add(1, Ordering::SeqCst));
    let mut project = body;
    project["id"] = json!(id);
    state.projects.lock().unwrap().push(project.clone());
    // Bare payload — no envelope on this route.
    Ok(Json(project))
}

async fn get_project(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    let projects = state.projects.lock().unwrap();
    match projects
        .iter()
        .find(|p| p.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(project) => Ok(Json(project.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "project not found" })),
        )),
    }
}

async fn update_project(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    if state.fail_update.load(Ordering::SeqCst) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "update failed" })),
        ));
    }

    let mut projects = state.projects.lock().unwrap();
    match projects
        .iter_mut()
        .find(|p| p.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(slot) => {
            let mut project = body;
            project["id"] = json!(id);
            *slot = project.clone();
            Ok(Json(project))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "project not found" })),
        )),
    }
}

async fn delete_project(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    let mut projects = state.projects.lock().unwrap();
    let before = projects.len();
    projects.retain(|p| p.get("id").and_then(Value::as_str) != Some(id.as_str()));
    if projects.len() == before {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "project not found" })),
        ));
    }
    Ok(Json(json!({ "code": 0, "message": "ok", "data": null })))
}

async fn add_members(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    let added = body
        .get("userIds")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0) as u64;

    let mut projects = state.projects.lock().unwrap();
    match projects
        .iter_mut()
        .find(|p| p.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(project) => {
            let members = project.get("members").and_then(Value::as_u64).unwrap_or(0);
            project["members"] = json!(members + added);
            Ok(Json(json!({ "code": 0, "message": "ok", "data": null })))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "project not found" })),
        )),
    }
}

async fn remove_member(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path((id, _user)): Path<(String, String)>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    let mut projects = state.projects.lock().unwrap();
    match projects
        .iter_mut()
        .find(|p| p.get("id").and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(project) => {
            let members = project.get("members").and_then(Value::as_u64).unwrap_or(0);
            project["members"] = json!(members.saturating_sub(1));
            Ok(Json(json!({ "code": 0, "message": "ok", "data": null })))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "project not found" })),
        )),
    }
}

async fn change_role(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    if params.get("role").is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "role is required" })),
        ));
    }
    Ok(Json(json!({ "code": 0, "message": "ok", "data": null })))
}

async fn search_users(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    let keyword = params.get("keyword").cloned().unwrap_or_default();
    Ok(Json(json!([
        { "userId": "u1", "name": format!("{keyword}-match"), "role": "member" },
    ])))
}

async fn available_members(headers: HeaderMap, Json(_body): Json<Value>) -> Reply {
    if !authed(&headers) {
        return Err(unauthorized());
    }
    Ok(Json(json!({
        "code": 0,
        "message": "ok",
        "data": [
            { "id": "u2", "username": "Ravi", "role": "member" },
            { "userId": "u3", "name": "Kim", "role": "admin" },
        ],
    })))
}
