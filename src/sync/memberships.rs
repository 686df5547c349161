use std::collections::HashSet;

use super::tracker::Tracker;
use super::{PassReport, SyncError};
use crate::db::Database;
use crate::manifest::Manifest;
use crate::models::{CreateMembershipInput, MembershipRole, MembershipStatus};

const PASS: &str = "memberships";

/// Reconcile project↔user memberships.
///
/// For every member of every manifest project (owner skipped, duplicates
/// skipped): create the membership if absent, otherwise realign role and
/// reactivate when drifted. Memberships no longer implied by the manifest
/// are set to Removed, unless already Removed.
pub fn sync(db: &Database, manifest: &Manifest) -> Result<PassReport, SyncError> {
    let snapshot = db
        .get_all_memberships()
        .map_err(|e| SyncError::new(PASS, "snapshot", e))?;
    let mut tracker = Tracker::new(snapshot, |m| (m.project_id, m.user_id));
    let mut report = PassReport::default();

    for manifest_project in &manifest.projects {
        let project = db
            .get_project_by_title(&manifest_project.name)
            .map_err(|e| SyncError::new(PASS, manifest_project.name.clone(), e))?
            .ok_or_else(|| {
                SyncError::lookup(
                    PASS,
                    manifest_project.name.clone(),
                    format!("project {}", manifest_project.name),
                )
            })?;

        let mut seen: HashSet<&str> = HashSet::new();
        for username in &manifest_project.users {
            // Owners are implicit members; they never get a membership row
            if *username == manifest_project.owner {
                continue;
            }
            if !seen.insert(username.as_str()) {
                continue;
            }

            let entity = format!("{} -> {}", username, manifest_project.name);
            let user = db
                .get_user_by_username(username)
                .map_err(|e| SyncError::new(PASS, entity.clone(), e))?
                .ok_or_else(|| {
                    SyncError::lookup(PASS, entity.clone(), format!("user {}", username))
                })?;

            let role = if manifest_project.admins.contains(username) {
                MembershipRole::Manager
            } else {
                MembershipRole::User
            };

            let existing = db
                .get_membership(project.id, user.id)
                .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;

            match existing {
                Some(membership) => {
                    if membership.role != role || membership.status != MembershipStatus::Active {
                        tracing::info!("updating membership {}", entity);
                        db.update_membership(membership.id, role, MembershipStatus::Active)
                            .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;
                        report.updated += 1;
                    }
                }
                None => {
                    tracing::info!("creating membership {}", entity);
                    db.create_membership(CreateMembershipInput {
                        project_id: project.id,
                        user_id: user.id,
                        role,
                        status: MembershipStatus::Active,
                    })
                    .map_err(|e| SyncError::new(PASS, entity.clone(), e))?;
                    report.created += 1;
                }
            }

            tracker.mark(&(project.id, user.id));
        }
    }

    for membership in tracker.remaining() {
        if membership.status == MembershipStatus::Removed {
            continue;
        }
        let entity = format!("{} -> {}", membership.user_id, membership.project_id);
        tracing::info!("removing membership {}", entity);
        db.set_membership_status(membership.id, MembershipStatus::Removed)
            .map_err(|e| SyncError::new(PASS, entity, e))?;
        report.retired += 1;
    }

    Ok(report)
}
