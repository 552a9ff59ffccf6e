//! Canonical client-side records.
//!
//! Backend payloads are duck-typed in places (absent fields, `{data: [...]}`
//! wrappers around lists, member objects keyed by `userId` or `id`). All of
//! that is resolved here, at the parse boundary, so the stores only ever see
//! one canonical shape.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;

// ─── Project status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Project record ──────────────────────────────────────────────────────────

/// A fully-normalized project record.
///
/// Absent `status`, `deadline`, `members` and `progress` fields are filled
/// with their defaults during deserialization (planning, today, 0, 0), and
/// `progress` is clamped to 0–100 — the store never holds a partially
/// populated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "status_or_planning")]
    pub status: ProjectStatus,
    #[serde(default = "today", deserialize_with = "deadline_or_today")]
    pub deadline: NaiveDate,
    #[serde(default)]
    pub members: u32,
    #[serde(default, deserialize_with = "clamped_progress")]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Parse a single project payload into the canonical shape.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::network(format!("malformed project payload: {e}")))
    }

    /// Parse a project-list payload.
    ///
    /// The backend sometimes hands back the list bare and sometimes as
    /// `{data: [...]}` (when a handler skipped the envelope). Records that do
    /// not parse are skipped with a warning rather than failing the whole
    /// list.
    pub fn list_from_value(value: Value) -> Vec<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!("project list payload is not an array — treating as empty");
                    return Vec::new();
                }
            },
            _ => {
                warn!("project list payload is not an array — treating as empty");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| match Self::from_value(item) {
                Ok(project) => Some(project),
                Err(e) => {
                    warn!("skipping unparsable project record: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Client-side create/update payload. `id` presence selects update vs create
/// in `ProjectStore::submit_form`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team_ids: Vec<String>,
}

// ─── Project members ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
}

/// One member of a project. The backend keys members by `userId` in some
/// handlers and `id` in others; both are accepted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    #[serde(alias = "id")]
    pub user_id: String,
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

// ─── Deserialization helpers ─────────────────────────────────────────────────

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn status_or_planning<'de, D>(deserializer: D) -> Result<ProjectStatus, D::Error>
where
    D: Deserializer<'de>,
{
    // An explicit null counts as absent, same as a missing field.
    Ok(Option::<ProjectStatus>::deserialize(deserializer)?.unwrap_or_default())
}

fn deadline_or_today<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NaiveDate>::deserialize(deserializer)?.unwrap_or_else(today))
}

fn clamped_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(raw.clamp(0, 100) as u8)
}
