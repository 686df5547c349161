//! Domain models for AllocSync.
//!
//! # Core Concepts
//!
//! Every entity kind here mirrors a record in the resource-management store.
//! The reconciliation passes never delete records: an entity absent from the
//! manifest has its status flipped to a terminal-but-revivable value
//! (`Archived`, `Expired`, `Removed`, or `active = false`), and a later
//! manifest that lists it again flips it back to active.
//!
//! - [`User`]: account keyed by username; retired by deactivation.
//! - [`Project`]: keyed by title, owned by a user; retired by archiving.
//!   The owner is implicit and never holds a [`Membership`] row.
//! - [`Membership`]: project↔user link with a role; retired to `Removed`.
//! - [`Resource`]: the singleton cluster resource; created once, never retired.
//! - [`Allocation`]: one per project, carries the resource; retired to `Expired`.
//! - [`AllocationUser`]: allocation↔user link; retired to `Removed`.

mod allocation;
mod membership;
mod project;
mod resource;
mod user;

pub use allocation::*;
pub use membership::*;
pub use project::*;
pub use resource::*;
pub use user::*;
