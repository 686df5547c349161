//! AllocSync: one-way reconciliation of a cluster resource-management store
//! against an externally supplied manifest of users and projects.
//!
//! The manifest is ground truth. Records are created, updated, or
//! soft-retired to match it — never deleted. See [`sync`] for the engine,
//! [`coordinator`] for run locking and manifest persistence, and [`api`] for
//! the HTTP surface.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod manifest;
pub mod models;
pub mod sync;
