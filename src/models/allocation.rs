use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resource allocation granted to a project.
///
/// One active allocation per project, keyed by `project_id`. Attached
/// resources live in the `allocation_resources` join table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: AllocationStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Active,
    Expired,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Input for creating a new allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAllocationInput {
    pub project_id: Uuid,
    pub status: AllocationStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// An allocation↔user association, keyed by `(allocation_id, user_id)`.
///
/// Mirrors [`super::Membership`] one level down: project members get a row
/// under the project's allocation, owners are skipped identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationUser {
    pub id: Uuid,
    pub allocation_id: Uuid,
    pub user_id: Uuid,
    pub status: AllocationUserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationUserStatus {
    Active,
    Removed,
}

impl AllocationUserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Removed => "removed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// Input for creating a new allocation user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAllocationUserInput {
    pub allocation_id: Uuid,
    pub user_id: Uuid,
    pub status: AllocationUserStatus,
}
