//! Project collection store.
//!
//! Owns the in-memory project list and the UI-facing state around it:
//! loading flag, last error, the create/edit form machine, and the
//! client-side filter/search/sort settings. All CRUD goes through the API
//! client; filtering and searching are purely local so typing in the search
//! box never costs a network round-trip.
//!
//! Every fetch carries a monotonically increasing generation token. A fetch
//! that resolves after a newer one was issued is discarded, so an
//! out-of-order response can never clobber fresher data.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::model::{MemberRole, Project, ProjectDraft, ProjectMember, ProjectStatus};
use crate::store::{ChangeBroadcaster, StoreEvent};

// ─── UI state types ──────────────────────────────────────────────────────────

/// Status filter applied to the visible projection. `All` sends no `status`
/// query param on fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ProjectStatus),
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    /// Value for the `status` query param — `None` for `All`.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.as_str()),
        }
    }

    fn matches(&self, project: &Project) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => project.status == *status,
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::default(),
            ascending: true,
        }
    }
}

/// The create/edit form machine. Only one form is ever active.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Closed,
    Create,
    Edit(Project),
}

impl FormState {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormState::Closed)
    }

    pub fn editing(&self) -> Option<&Project> {
        match self {
            FormState::Edit(project) => Some(project),
            _ => None,
        }
    }
}

/// Cloneable snapshot of the whole store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub loading: bool,
    pub error: Option<String>,
    pub form: FormState,
    pub filter: StatusFilter,
    pub search: String,
    pub sort: SortSpec,
}

impl ProjectsState {
    /// Derived read-only view: status filter AND case-insensitive substring
    /// match over name, description and tags, then a stable sort by the
    /// selected key. Ties keep original collection order.
    pub fn visible_projects(&self) -> Vec<Project> {
        let needle = self.search.trim().to_lowercase();
        let mut list: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| self.filter.matches(p))
            .filter(|p| needle.is_empty() || matches_search(p, &needle))
            .cloned()
            .collect();

        let sort = self.sort;
        list.sort_by(|a, b| {
            let ord = match sort.key {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::Progress => a.progress.cmp(&b.progress),
            };
            if sort.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        list
    }
}

fn matches_search(project: &Project, needle: &str) -> bool {
    project.name.to_lowercase().contains(needle)
        || project.description.to_lowercase().contains(needle)
        || project
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct ProjectStore {
    api: Arc<ApiClient>,
    notifier: ChangeBroadcaster,
    state: RwLock<ProjectsState>,
    /// Generation counter for in-flight fetches. The newest issued fetch is
    /// the only one allowed to apply its result.
    fetch_seq: AtomicU64,
}

impl ProjectStore {
    pub fn new(api: Arc<ApiClient>, notifier: ChangeBroadcaster) -> Self {
        Self {
            api,
            notifier,
            state: RwLock::new(ProjectsState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> ProjectsState {
        self.state.read().await.clone()
    }

    pub async fn visible_projects(&self) -> Vec<Project> {
        self.state.read().await.visible_projects()
    }

    // ─── CRUD ────────────────────────────────────────────────────────────────

    /// Replace the collection with the backend's project list.
    ///
    /// On failure the collection is cleared and the error recorded; the
    /// error also propagates to the caller. A response that arrives after a
    /// newer fetch was issued is discarded.
    pub async fn fetch_projects(&self, filter: StatusFilter) -> Result<(), ApiError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin_action().await;

        let query = [("status", filter.query_value())];
        let result = self.api.get("/projects", &query).await;

        let mut state = self.state.write().await;
        if self.fetch_seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "discarding stale project fetch");
            return Ok(());
        }
        state.loading = false;
        let out = match result {
            Ok(data) => {
                state.projects = Project::list_from_value(data);
                state.filter = filter;
                Ok(())
            }
            Err(e) => {
                state.projects.clear();
                state.error = Some(e.to_string());
                Err(e)
            }
        };
        drop(state);
        self.notifier.notify(StoreEvent::ProjectsChanged);
        out
    }

    /// Create a project and append it to the collection.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project, ApiError> {
        let body = to_body(&draft)?;
        self.begin_action().await;

        let result = self.api.post("/projects", &body).await;
        let parsed = result.and_then(Project::from_value);

        let mut state = self.state.write().await;
        state.loading = false;
        let out = match parsed {
            Ok(project) => {
                state.projects.push(project.clone());
                Ok(project)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        };
        drop(state);
        self.notifier.notify(StoreEvent::ProjectsChanged);
        out
    }

    /// Update a project by id. The matching record is fully replaced, not
    /// merged; an id with no local match leaves the collection unchanged.
    pub async fn update_project(&self, id: &str, draft: ProjectDraft) -> Result<Project, ApiError> {
        let body = to_body(&draft)?;
        self.begin_action().await;

        let result = self.api.put(&format!("/projects/{id}"), &body).await;
        let parsed = result.and_then(Project::from_value);

        let mut state = self.state.write().await;
        state.loading = false;
        let out = match parsed {
            Ok(project) => {
                if let Some(slot) = state.projects.iter_mut().find(|p| p.id == id) {
                    *slot = project.clone();
                }
                Ok(project)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        };
        drop(state);
        self.notifier.notify(StoreEvent::ProjectsChanged);
        out
    }

    /// Delete a project by id and drop it from the collection.
    ///
    /// Idempotent from the caller's perspective: a backend 404 and an id
    /// that is already absent locally are both no-ops, not errors.
    pub async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        self.begin_action().await;

        let result = self.api.delete(&format!("/projects/{id}")).await;

        let mut state = self.state.write().await;
        state.loading = false;
        let out = match result {
            Ok(_) => {
                state.projects.retain(|p| p.id != id);
                Ok(())
            }
            Err(e) if e.status() == 404 => {
                debug!(id, "delete target already gone");
                state.projects.retain(|p| p.id != id);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        };
        drop(state);
        self.notifier.notify(StoreEvent::ProjectsChanged);
        out
    }

    /// Fetch a single project and refresh its collection entry when present.
    pub async fn fetch_project(&self, id: &str) -> Result<Project, ApiError> {
        let data = self.api.get(&format!("/projects/{id}"), &[]).await?;
        let project = Project::from_value(data)?;

        let mut state = self.state.write().await;
        if let Some(slot) = state.projects.iter_mut().find(|p| p.id == id) {
            *slot = project.clone();
            drop(state);
            self.notifier.notify(StoreEvent::ProjectsChanged);
        }
        Ok(project)
    }

    // ─── Form machine ────────────────────────────────────────────────────────

    pub async fn open_create_form(&self) {
        self.state.write().await.form = FormState::Create;
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    pub async fn open_edit_form(&self, project: Project) {
        self.state.write().await.form = FormState::Edit(project);
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    pub async fn close_form(&self) {
        self.state.write().await.form = FormState::Closed;
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    /// Create or update based on the draft's id, closing the form only when
    /// the call succeeds. On failure the form stays open so the user can
    /// correct the input and retry.
    pub async fn submit_form(&self, draft: ProjectDraft) -> Result<Project, ApiError> {
        let result = match draft.id.clone() {
            Some(id) => self.update_project(&id, draft).await,
            None => self.create_project(draft).await,
        };
        if result.is_ok() {
            self.close_form().await;
        }
        result
    }

    // ─── Filter / search / sort (no I/O) ─────────────────────────────────────

    pub async fn set_filter_status(&self, filter: StatusFilter) {
        self.state.write().await.filter = filter;
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.state.write().await.search = query.into();
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    pub async fn set_sort(&self, sort: SortSpec) {
        self.state.write().await.sort = sort;
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }

    // ─── Members ─────────────────────────────────────────────────────────────

    /// Add users to a project, then refresh its member count from the
    /// backend.
    pub async fn add_members(
        &self,
        project_id: &str,
        user_ids: &[String],
        role: MemberRole,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "userIds": user_ids, "role": role });
        self.api
            .post(&format!("/projects/{project_id}/members"), &body)
            .await?;

        // The backend owns the authoritative count — refetch rather than
        // guessing how many of the ids were new.
        self.fetch_project(project_id).await?;
        Ok(())
    }

    pub async fn remove_member(&self, project_id: &str, user_id: &str) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/projects/{project_id}/members/{user_id}"))
            .await?;

        let mut state = self.state.write().await;
        if let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) {
            project.members = project.members.saturating_sub(1);
            drop(state);
            self.notifier.notify(StoreEvent::ProjectsChanged);
        }
        Ok(())
    }

    pub async fn change_member_role(
        &self,
        project_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<(), ApiError> {
        let role = match role {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        };
        self.api
            .put_query(
                &format!("/projects/{project_id}/members/{user_id}/role"),
                &[("role", Some(role))],
            )
            .await?;
        Ok(())
    }

    pub async fn search_users(&self, keyword: &str) -> Result<Vec<ProjectMember>, ApiError> {
        let data = self
            .api
            .get("/projects/users/search", &[("keyword", Some(keyword))])
            .await?;
        members_from_value(data)
    }

    pub async fn available_members(
        &self,
        team_ids: &[String],
    ) -> Result<Vec<ProjectMember>, ApiError> {
        let body = serde_json::json!({ "teamIds": team_ids });
        let data = self.api.post("/projects/members/available", &body).await?;
        members_from_value(data)
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    async fn begin_action(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
        drop(state);
        self.notifier.notify(StoreEvent::ProjectsChanged);
    }
}

fn to_body(draft: &ProjectDraft) -> Result<Value, ApiError> {
    serde_json::to_value(draft).map_err(|e| ApiError::network(format!("unserializable draft: {e}")))
}

fn members_from_value(value: Value) -> Result<Vec<ProjectMember>, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::network(format!("malformed member list: {e}")))
}
