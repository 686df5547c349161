use super::tracker::Tracker;
use super::{PassReport, SyncError};
use crate::config::SyncConfig;
use crate::db::Database;
use crate::manifest::Manifest;
use crate::models::{AllocationStatus, CreateAllocationInput};

const PASS: &str = "allocations";

/// Reconcile allocations: one per manifest project.
///
/// Missing allocations are created Active with the configured date range and
/// the cluster resource attached. Allocations whose project left the
/// manifest are set to Expired, unless already Expired.
pub fn sync(
    db: &Database,
    config: &SyncConfig,
    manifest: &Manifest,
) -> Result<PassReport, SyncError> {
    let snapshot = db
        .get_all_allocations()
        .map_err(|e| SyncError::new(PASS, "snapshot", e))?;
    let mut tracker = Tracker::new(snapshot, |a| a.project_id);
    let mut report = PassReport::default();

    let resource = db
        .get_resource_by_name(&config.resource_name)
        .map_err(|e| SyncError::new(PASS, config.resource_name.clone(), e))?
        .ok_or_else(|| {
            SyncError::lookup(
                PASS,
                config.resource_name.clone(),
                format!("resource {}", config.resource_name),
            )
        })?;

    for manifest_project in &manifest.projects {
        let title = &manifest_project.name;
        let project = db
            .get_project_by_title(title)
            .map_err(|e| SyncError::new(PASS, title.clone(), e))?
            .ok_or_else(|| SyncError::lookup(PASS, title.clone(), format!("project {}", title)))?;

        let existing = db
            .get_allocation_by_project(project.id)
            .map_err(|e| SyncError::new(PASS, title.clone(), e))?;

        if existing.is_none() {
            tracing::info!("creating allocation for {}", title);
            let allocation = db
                .create_allocation(CreateAllocationInput {
                    project_id: project.id,
                    status: AllocationStatus::Active,
                    start_date: config.allocation_start,
                    end_date: config.allocation_end,
                })
                .map_err(|e| SyncError::new(PASS, title.clone(), e))?;
            db.attach_allocation_resource(allocation.id, resource.id)
                .map_err(|e| SyncError::new(PASS, title.clone(), e))?;
            report.created += 1;
        }

        tracker.mark(&project.id);
    }

    for allocation in tracker.remaining() {
        if allocation.status == AllocationStatus::Expired {
            continue;
        }
        let entity = allocation.project_id.to_string();
        tracing::info!("expiring allocation for project {}", entity);
        db.set_allocation_status(allocation.id, AllocationStatus::Expired)
            .map_err(|e| SyncError::new(PASS, entity, e))?;
        report.retired += 1;
    }

    Ok(report)
}
