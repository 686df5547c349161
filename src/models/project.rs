use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project in the resource-management store.
///
/// Projects are keyed by `title`. The owner is a resolved [`super::User`] id;
/// owners are implicit members and never appear in the memberships table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub description: String,
    pub status: ProjectStatus,
    /// Flagged true on every ingest for projects still present in the
    /// manifest, so each sync cycle queues the project for review.
    pub review_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle status of a project.
///
/// - `Active`: listed in the current manifest
/// - `Archived`: dropped from the manifest; revived if it reappears
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub title: String,
    pub owner_id: Uuid,
    pub description: String,
    pub status: ProjectStatus,
    pub review_required: bool,
}
