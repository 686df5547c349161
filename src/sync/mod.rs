//! The reconciliation engine.
//!
//! Six passes run in strict order — users, projects, memberships, resource,
//! allocations, allocation users — because each pass resolves records the
//! previous ones committed (a membership needs its project row, an
//! allocation user needs its allocation row). Every pass fetches its own
//! snapshot from the store at pass start, so it observes earlier passes'
//! writes; nothing is cached across passes.
//!
//! The first unrecoverable error from any per-record operation aborts the
//! pass and the whole run. The caller's [`crate::coordinator::IngestGuard`]
//! releases the ingest lock on every exit path.

pub mod tracker;

mod allocation_users;
mod allocations;
mod memberships;
mod projects;
mod resources;
mod users;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SyncConfig;
use crate::db::Database;
use crate::manifest::Manifest;

/// Placeholder description stamped onto every project still present in the
/// manifest. Paired with `review_required`, it queues the project for a
/// human pass after each sync cycle.
pub const PROJECT_DESCRIPTION_PLACEHOLDER: &str = "enter description";

/// A fatal reconciliation failure: which pass, which entity, and the cause.
#[derive(Debug, Error)]
#[error("{pass} pass failed for {entity}: {source}")]
pub struct SyncError {
    pub pass: &'static str,
    pub entity: String,
    #[source]
    pub source: anyhow::Error,
}

impl SyncError {
    pub fn new(pass: &'static str, entity: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            pass,
            entity: entity.into(),
            source,
        }
    }

    /// A manifest-referenced record that could not be resolved in the store.
    pub fn lookup(pass: &'static str, entity: impl Into<String>, what: impl Into<String>) -> Self {
        Self::new(pass, entity, anyhow!("{} not found", what.into()))
    }
}

/// Created/updated/retired counts for one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub created: u64,
    pub updated: u64,
    pub retired: u64,
}

impl PassReport {
    pub fn changes(&self) -> u64 {
        self.created + self.updated + self.retired
    }
}

/// Per-pass outcome of a completed ingest run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncReport {
    pub users: PassReport,
    pub projects: PassReport,
    pub memberships: PassReport,
    pub resources: PassReport,
    pub allocations: PassReport,
    pub allocation_users: PassReport,
}

impl SyncReport {
    /// Total writes across all passes. Zero means the store already matched
    /// the manifest — the convergence property tests assert on this.
    pub fn total_changes(&self) -> u64 {
        self.users.changes()
            + self.projects.changes()
            + self.memberships.changes()
            + self.resources.changes()
            + self.allocations.changes()
            + self.allocation_users.changes()
    }
}

/// Run the six reconciliation passes against one manifest.
pub fn run_ingest(
    db: &Database,
    config: &SyncConfig,
    manifest: &Manifest,
) -> Result<SyncReport, SyncError> {
    let users = users::sync(db, config, manifest)?;
    tracing::info!("users synced");
    let projects = projects::sync(db, manifest)?;
    tracing::info!("projects synced");
    let memberships = memberships::sync(db, manifest)?;
    tracing::info!("memberships synced");
    let resources = resources::sync(db, config)?;
    tracing::info!("resources synced");
    let allocations = allocations::sync(db, config, manifest)?;
    tracing::info!("allocations synced");
    let allocation_users = allocation_users::sync(db, manifest)?;
    tracing::info!("allocation users synced");

    Ok(SyncReport {
        users,
        projects,
        memberships,
        resources,
        allocations,
        allocation_users,
    })
}
