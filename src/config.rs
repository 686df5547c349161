//! Sync configuration loaded from environment variables.

use chrono::NaiveDate;

/// Site-specific constants the reconciliation passes depend on.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Domain used to derive emails for created users (from ALLOCSYNC_EMAIL_DOMAIN).
    pub email_domain: String,
    /// Name of the singleton cluster resource (from ALLOCSYNC_RESOURCE_NAME).
    pub resource_name: String,
    /// Description of the cluster resource (from ALLOCSYNC_RESOURCE_DESCRIPTION).
    pub resource_description: String,
    /// Start date applied to newly created allocations (from ALLOCSYNC_ALLOCATION_START).
    pub allocation_start: NaiveDate,
    /// End date applied to newly created allocations (from ALLOCSYNC_ALLOCATION_END).
    pub allocation_end: NaiveDate,
    /// Administrative bootstrap account never deactivated by the users pass
    /// (from ALLOCSYNC_BOOTSTRAP_USER).
    pub bootstrap_username: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            email_domain: "hpc.example.edu".to_string(),
            resource_name: "cluster".to_string(),
            resource_description: "Primary HPC cluster".to_string(),
            allocation_start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            allocation_end: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
            bootstrap_username: "admin".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let date = |var: &str, fallback: NaiveDate| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            email_domain: std::env::var("ALLOCSYNC_EMAIL_DOMAIN").unwrap_or(defaults.email_domain),
            resource_name: std::env::var("ALLOCSYNC_RESOURCE_NAME")
                .unwrap_or(defaults.resource_name),
            resource_description: std::env::var("ALLOCSYNC_RESOURCE_DESCRIPTION")
                .unwrap_or(defaults.resource_description),
            allocation_start: date("ALLOCSYNC_ALLOCATION_START", defaults.allocation_start),
            allocation_end: date("ALLOCSYNC_ALLOCATION_END", defaults.allocation_end),
            bootstrap_username: std::env::var("ALLOCSYNC_BOOTSTRAP_USER")
                .unwrap_or(defaults.bootstrap_username),
        }
    }
}
