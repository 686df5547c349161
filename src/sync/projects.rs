use super::tracker::Tracker;
use super::{PassReport, SyncError, PROJECT_DESCRIPTION_PLACEHOLDER};
use crate::db::Database;
use crate::manifest::Manifest;
use crate::models::{CreateProjectInput, ProjectStatus};

const PASS: &str = "projects";

/// Reconcile projects against the manifest's project set.
///
/// Missing projects are created Active with their owner resolved from the
/// users pass. Projects still present are forced back to Active with
/// `review_required` set and a placeholder description on every ingest —
/// each sync cycle queues them for review. Projects dropped from the
/// manifest are archived, unless already archived.
pub fn sync(db: &Database, manifest: &Manifest) -> Result<PassReport, SyncError> {
    let snapshot = db
        .get_all_projects()
        .map_err(|e| SyncError::new(PASS, "snapshot", e))?;
    let mut tracker = Tracker::new(snapshot, |p| p.title.clone());
    let mut report = PassReport::default();

    for manifest_project in &manifest.projects {
        let title = &manifest_project.name;
        let existing = db
            .get_project_by_title(title)
            .map_err(|e| SyncError::new(PASS, title.clone(), e))?;

        match existing {
            Some(project) => {
                // Still-present projects are forced back to Active and queued
                // for review; skip the write when nothing has drifted so a
                // converged store sees no redundant updates
                let drifted = project.status != ProjectStatus::Active
                    || !project.review_required
                    || project.description != PROJECT_DESCRIPTION_PLACEHOLDER;
                if drifted {
                    db.update_project_sync_state(
                        project.id,
                        ProjectStatus::Active,
                        true,
                        PROJECT_DESCRIPTION_PLACEHOLDER,
                    )
                    .map_err(|e| SyncError::new(PASS, title.clone(), e))?;
                    report.updated += 1;
                }
            }
            None => {
                tracing::info!("creating project {}", title);
                let owner = db
                    .get_user_by_username(&manifest_project.owner)
                    .map_err(|e| SyncError::new(PASS, title.clone(), e))?
                    .ok_or_else(|| {
                        SyncError::lookup(
                            PASS,
                            title.clone(),
                            format!("owner {}", manifest_project.owner),
                        )
                    })?;
                db.create_project(CreateProjectInput {
                    title: title.clone(),
                    owner_id: owner.id,
                    description: PROJECT_DESCRIPTION_PLACEHOLDER.to_string(),
                    status: ProjectStatus::Active,
                    review_required: false,
                })
                .map_err(|e| SyncError::new(PASS, title.clone(), e))?;
                report.created += 1;
            }
        }

        tracker.mark(title);
    }

    for project in tracker.remaining() {
        if project.status == ProjectStatus::Archived {
            continue;
        }
        tracing::info!("archiving project {}", project.title);
        db.set_project_status(project.id, ProjectStatus::Archived)
            .map_err(|e| SyncError::new(PASS, project.title.clone(), e))?;
        report.retired += 1;
    }

    Ok(report)
}
