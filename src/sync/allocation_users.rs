use std::collections::HashSet;

use super::tracker::Tracker;
use super::{PassReport, SyncError};
use crate::db::Database;
use crate::manifest::Manifest;
use crate::models::{AllocationUserStatus, CreateAllocationUserInput};

const PASS: &str = "allocation_users";

/// Reconcile allocation↔user associations.
///
/// Mirrors the memberships pass against each project's allocation: owners
/// and duplicate usernames skipped, missing rows created Active, removed
/// rows reactivated on reappearance. Rows no longer implied by the manifest
/// are set to Removed, unless already Removed.
pub fn sync(db: &Database, manifest: &Manifest) -> Result<PassReport, SyncError> {
    let snapshot = db
        .get_all_allocation_users()
        .map_err(|e| SyncError::new(PASS, "snapshot", e))?;
    let mut tracker = Tracker::new(snapshot, |au| (au.allocation_id, au.user_id));
    let mut report = PassReport::default();

    for manifest_project in &manifest.projects {
        let title = &manifest_project.name;
        let project = db
            .get_project_by_title(title)
            .map_err(|e| SyncError::new(PASS, title.clone(), e))?
            .ok_or_else(|| SyncError::lookup(PASS, title.clone(), format!("project {}", title)))?;

        let allocation = db
            .get_allocation_by_project(project.id)
            .map_err(|e| SyncError::new(PASS, title.clone(), e))?
            .ok_or_else(|| {
                SyncError::lookup(PASS, title.clone(), format!("allocation for {}", title))
            })?;

        let mut seen: HashSet<&str> = HashSet::new();
        for username in &manifest_project.users {
            if *username == manifest_project.owner {
                continue;
            }
            if !seen.insert(username.as_str()) {
                continue;
            }

            let entity = format!("{} -> {}", username, title);
            let user = db
                .get_user_by_username(username)
                .map_err(|e| SyncError::new(PASS, entity.clone(), e))?
                .ok_or_else(|| {
                    SyncError::lookup(PASS, entity.clone(), format!("user {}", username))
                })?;

            let existing = db
                .get_allocation_user(allocation.id, user.id)
                .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;

            match existing {
                Some(allocation_user) => {
                    if allocation_user.status != AllocationUserStatus::Active {
                        tracing::info!("reactivating allocation user {}", entity);
                        db.set_allocation_user_status(
                            allocation_user.id,
                            AllocationUserStatus::Active,
                        )
                        .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;
                        report.updated += 1;
                    }
                }
                None => {
                    tracing::info!("creating allocation user {}", entity);
                    db.create_allocation_user(CreateAllocationUserInput {
                        allocation_id: allocation.id,
                        user_id: user.id,
                        status: AllocationUserStatus::Active,
                    })
                    .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;
                    report.created += 1;
                }
            }

            tracker.mark(&(allocation.id, user.id));
        }
    }

    for allocation_user in tracker.remaining() {
        if allocation_user.status == AllocationUserStatus::Removed {
            continue;
        }
        let entity = format!(
            "{} -> {}",
            allocation_user.user_id, allocation_user.allocation_id
        );
        tracing::info!("removing allocation user {}", entity);
        db.set_allocation_user_status(allocation_user.id, AllocationUserStatus::Removed)
            .map_err(|e| SyncError::new(PASS, entity, e))?;
        report.retired += 1;
    }

    Ok(report)
}
