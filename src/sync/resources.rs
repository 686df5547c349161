use super::{PassReport, SyncError};
use crate::config::SyncConfig;
use crate::db::Database;
use crate::models::CreateResourceInput;

const PASS: &str = "resources";

/// Ensure the singleton cluster resource exists.
///
/// Created once by name; never retired and never updated after creation.
pub fn sync(db: &Database, config: &SyncConfig) -> Result<PassReport, SyncError> {
    let mut report = PassReport::default();

    let existing = db
        .get_resource_by_name(&config.resource_name)
        .map_err(|e| SyncError::new(PASS, config.resource_name.clone(), e))?;

    if existing.is_none() {
        tracing::info!("creating resource {}", config.resource_name);
        db.create_resource(CreateResourceInput {
            name: config.resource_name.clone(),
            description: config.resource_description.clone(),
            is_allocatable: true,
            is_available: true,
            is_public: true,
            requires_payment: false,
        })
        .map_err(|e| SyncError::new(PASS, config.resource_name.clone(), e))?;
        report.created += 1;
    }

    Ok(report)
}
