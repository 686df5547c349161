use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The cluster resource allocations attach to.
///
/// A singleton: exactly one record, named by configuration, created on the
/// first ingest and never retired or updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_allocatable: bool,
    pub is_available: bool,
    pub is_public: bool,
    pub requires_payment: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating the cluster resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceInput {
    pub name: String,
    pub description: String,
    pub is_allocatable: bool,
    pub is_available: bool,
    pub is_public: bool,
    pub requires_payment: bool,
}
