use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account in the resource-management store.
///
/// Users are keyed by `username` — the manifest never carries store ids.
/// A user dropped from the manifest is deactivated, not deleted, so that a
/// later manifest can revive the same record with its history intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Derived by the users pass as `username@<configured domain>`.
    pub email: String,
    pub active: bool,
}
