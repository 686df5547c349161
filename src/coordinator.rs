//! Run-level coordination: the single-flight ingest lock and the persisted
//! manifest with its content hash.
//!
//! Both live as files under one run directory. The lock is acquired with an
//! atomic `create_new` so two concurrent triggers can never both win; the
//! manifest body is written via temp-file rename and the hash is recorded
//! only after the body is durable, so a crash between the two writes leaves
//! the previous hash in place and the next upload simply re-saves.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::manifest::Manifest;

const LOCK_FILE: &str = "ingest.lock";
const MANIFEST_FILE: &str = "manifest.json";
const HASH_FILE: &str = "manifest.hash";

/// Outcome of a manifest upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The supplied content hash matches the stored one; nothing was written.
    AlreadyCurrent,
    /// A new manifest body and hash were persisted.
    Saved,
}

/// Coordinates ingest runs against a run directory.
pub struct Coordinator {
    run_dir: PathBuf,
}

impl Coordinator {
    /// Open (creating if needed) the run directory and clear any lock left
    /// behind by a crashed run. Call once at process startup.
    pub fn new(run_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

        let coordinator = Self { run_dir };
        match fs::remove_file(coordinator.lock_path()) {
            Ok(()) => tracing::warn!("Cleared stale ingest lock from a previous run"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("Failed to clear stale ingest lock"),
        }

        Ok(coordinator)
    }

    fn lock_path(&self) -> PathBuf {
        self.run_dir.join(LOCK_FILE)
    }

    fn manifest_path(&self) -> PathBuf {
        self.run_dir.join(MANIFEST_FILE)
    }

    fn hash_path(&self) -> PathBuf {
        self.run_dir.join(HASH_FILE)
    }

    /// Try to acquire the single-flight ingest lock.
    ///
    /// Returns `Ok(None)` when another run holds it. The returned guard
    /// releases the lock on drop, so every exit path from an ingest —
    /// success, pass failure, panic unwind — unlocks.
    pub fn try_lock(&self) -> Result<Option<IngestGuard>> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.lock_path())
        {
            Ok(mut file) => {
                // Owner pid and timestamp, for diagnosing a wedged lock by hand
                let _ = writeln!(file, "pid={} acquired={}", std::process::id(), Utc::now());
                Ok(Some(IngestGuard {
                    path: self.lock_path(),
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e).context("Failed to create ingest lock"),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock_path().exists()
    }

    /// The hash of the most recently persisted manifest, if any.
    pub fn current_hash(&self) -> Option<String> {
        fs::read_to_string(self.hash_path())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Persist a manifest under the caller-supplied content hash.
    ///
    /// Re-uploading the currently stored hash is a no-op. Otherwise the body
    /// is written first (atomically, via rename) and the hash after it.
    pub fn save_manifest(&self, manifest: &Manifest, content_hash: &str) -> Result<SaveOutcome> {
        if self.current_hash().as_deref() == Some(content_hash) {
            return Ok(SaveOutcome::AlreadyCurrent);
        }

        let body = manifest
            .to_json()
            .context("Failed to serialize manifest")?;

        let tmp_path = self.run_dir.join(format!("{}.tmp", MANIFEST_FILE));
        fs::write(&tmp_path, body).context("Failed to write manifest")?;
        fs::rename(&tmp_path, self.manifest_path()).context("Failed to persist manifest")?;

        fs::write(self.hash_path(), content_hash).context("Failed to persist manifest hash")?;

        Ok(SaveOutcome::Saved)
    }

    /// Load the most recently persisted manifest.
    pub fn load_manifest(&self) -> Result<Manifest> {
        let body = fs::read_to_string(self.manifest_path())
            .context("Failed to read persisted manifest")?;
        Ok(Manifest::from_json(&body)?)
    }
}

/// Held for the duration of one ingest run; releases the lock when dropped.
pub struct IngestGuard {
    path: PathBuf,
}

impl Drop for IngestGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::error!("Failed to release ingest lock: {}", e);
        }
    }
}
