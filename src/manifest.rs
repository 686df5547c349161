//! The desired-state manifest uploaded by the upstream identity system.
//!
//! The manifest is ground truth: reconciliation only ever moves the store
//! toward it. A manifest is immutable once accepted and is superseded
//! wholesale by the next accepted one — there is no merging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an uploaded document cannot be parsed into a [`Manifest`].
///
/// Partial manifests are never accepted: any missing key or wrong shape
/// rejects the whole upload before anything is written.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Desired end state: the full set of users and projects that should exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub users: Vec<ManifestUser>,
    pub projects: Vec<ManifestProject>,
}

/// A user as described by the manifest. Usernames are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestUser {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
}

/// A project as described by the manifest.
///
/// `users` is the member list and `admins` the sublist that gets the Manager
/// role. The owner need not appear in `users`; when it does, the membership
/// passes skip it (owners are implicit, never enumerated members).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestProject {
    pub name: String,
    pub owner: String,
    pub users: Vec<String>,
    pub admins: Vec<String>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "users": [
            {"username": "alice", "firstname": "Alice", "lastname": "Adams"},
            {"username": "bob", "firstname": "Bob", "lastname": "Brown"}
        ],
        "projects": [
            {"name": "p1", "owner": "bob", "users": ["alice"], "admins": []}
        ]
    }"#;

    #[test]
    fn parses_a_valid_document() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.users.len(), 2);
        assert_eq!(manifest.projects.len(), 1);
        assert_eq!(manifest.projects[0].owner, "bob");
        assert_eq!(manifest.projects[0].users, vec!["alice"]);
    }

    #[test]
    fn round_trips_structurally() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let reparsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn rejects_missing_fields() {
        let err = Manifest::from_json(r#"{"users": [{"username": "x"}], "projects": []}"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_wrong_shapes() {
        let err = Manifest::from_json(
            r#"{"users": [], "projects": [{"name": "p", "owner": "o", "users": "notalist", "admins": []}]}"#,
        );
        assert!(err.is_err());
    }
}
