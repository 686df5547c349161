use super::tracker::Tracker;
use super::{PassReport, SyncError};
use crate::config::SyncConfig;
use crate::db::Database;
use crate::manifest::Manifest;
use crate::models::CreateUserInput;

const PASS: &str = "users";

/// Reconcile user accounts against the manifest's user set.
///
/// Missing users are created active with a derived email; inactive users
/// listed in the manifest are reactivated. Users absent from the manifest
/// are deactivated, except the bootstrap account and users already inactive.
pub fn sync(
    db: &Database,
    config: &SyncConfig,
    manifest: &Manifest,
) -> Result<PassReport, SyncError> {
    let snapshot = db
        .get_all_users()
        .map_err(|e| SyncError::new(PASS, "snapshot", e))?;
    let mut tracker = Tracker::new(snapshot, |u| u.username.clone());
    let mut report = PassReport::default();

    for manifest_user in &manifest.users {
        let username = &manifest_user.username;
        let existing = db
            .get_user_by_username(username)
            .map_err(|e| SyncError::new(PASS, username.clone(), e))?;

        let user = match existing {
            Some(user) => user,
            None => {
                tracing::info!("creating user {}", username);
                let user = db
                    .create_user(CreateUserInput {
                        username: username.clone(),
                        first_name: manifest_user.firstname.clone(),
                        last_name: manifest_user.lastname.clone(),
                        email: format!("{}@{}", username, config.email_domain),
                        active: true,
                    })
                    .map_err(|e| SyncError::new(PASS, username.clone(), e))?;
                report.created += 1;
                user
            }
        };

        if !user.active {
            tracing::info!("reactivating user {}", username);
            db.set_user_active(user.id, true)
                .map_err(|e| SyncError::new(PASS, username.clone(), e))?;
            report.updated += 1;
        }

        tracker.mark(&user.username);
    }

    for user in tracker.remaining() {
        if user.username == config.bootstrap_username {
            continue;
        }
        if !user.active {
            continue;
        }
        tracing::info!("deactivating user {}", user.username);
        db.set_user_active(user.id, false)
            .map_err(|e| SyncError::new(PASS, user.username.clone(), e))?;
        report.retired += 1;
    }

    Ok(report)
}
