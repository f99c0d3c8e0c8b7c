//! Durable manifest cache.
//!
//! The root manifest changes rarely, so it is persisted to disk inside a
//! `{ timestamp, index }` envelope and reused across sessions while it is
//! fresh (default window: 60 seconds). Anything wrong with the persisted
//! state (missing file, unreadable JSON, wrong shape) is treated as a
//! cache miss, never as an error.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::Manifest;

/// Default freshness window, in seconds.
pub const DEFAULT_FRESHNESS_SECS: i64 = 60;

/// On-disk envelope wrapping the manifest with its capture time.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Unix seconds at capture.
    timestamp: i64,
    index: Manifest,
}

/// File-backed manifest store with a freshness window.
pub struct ManifestStore {
    path: PathBuf,
    freshness_secs: i64,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>, freshness_secs: i64) -> Self {
        Self {
            path: path.into(),
            freshness_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted manifest if it is still within the freshness
    /// window. Stale or corrupted state is a miss.
    pub fn load_fresh(&self) -> Option<Manifest> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let envelope: Envelope = serde_json::from_str(&raw).ok()?;

        let age = Utc::now().timestamp() - envelope.timestamp;
        if age < 0 || age >= self.freshness_secs {
            tracing::debug!(path = %self.path.display(), age, "persisted manifest is stale");
            return None;
        }
        Some(envelope.index)
    }

    /// Persist the manifest with the current timestamp, replacing any
    /// previous envelope wholesale.
    ///
    /// Write failures are logged and swallowed: persistence is an
    /// optimization, not a requirement.
    pub fn store(&self, manifest: &Manifest) {
        let envelope = Envelope {
            timestamp: Utc::now().timestamp(),
            index: manifest.clone(),
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "could not create cache dir");
                return;
            }
        }

        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not persist manifest");
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not serialize manifest envelope"),
        }
    }

    /// Remove the persisted envelope, if any.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
