//! Offline response store with versioned cache generations.
//!
//! Static assets are served cache-first with a background revalidation,
//! archive API responses network-first with a cache fallback. Every cache
//! generation is named after an externally supplied version string, so
//! activating a new version sweeps the old generations away.
//!
//! Entries live as JSON files under `<root>/<name>-v<version>/` (static)
//! and `<root>/<name>-api-v<version>/` (API), keyed by the SHA-256 of
//! their URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::transport::Transport;

/// Fallback when no version string is supplied.
pub const DEFAULT_VERSION: &str = "0.1";

/// Disk-backed offline cache for one archive client.
#[derive(Clone)]
pub struct OfflineStore {
    root: PathBuf,
    name: String,
    version: String,
    transport: Arc<dyn Transport>,
}

impl OfflineStore {
    pub fn new(
        root: impl Into<PathBuf>,
        name: impl Into<String>,
        version: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            version: version.into(),
            transport,
        }
    }

    /// Directory for the current static-asset generation.
    pub fn static_dir(&self) -> PathBuf {
        self.root.join(format!("{}-v{}", self.name, self.version))
    }

    /// Directory for the current API-response generation.
    pub fn api_dir(&self) -> PathBuf {
        self.root.join(format!("{}-api-v{}", self.name, self.version))
    }

    /// Prefetch static assets into the current generation. Returns how
    /// many were stored; individual failures are skipped.
    pub async fn install(&self, urls: &[String]) -> usize {
        let mut stored = 0;
        for url in urls {
            if let Some(value) = self.transport.get_json(url).await {
                if write_entry(&self.static_dir(), url, &value) {
                    stored += 1;
                }
            }
        }
        tracing::debug!(stored, total = urls.len(), "offline install finished");
        stored
    }

    /// Delete cache generations belonging to other versions.
    pub fn activate(&self) {
        let keep = [self.static_dir(), self.api_dir()];
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || keep.contains(&path) {
                continue;
            }
            let is_ours = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&format!("{}-", self.name)))
                .unwrap_or(false);
            if is_ours {
                tracing::debug!(path = %path.display(), "deleting old cache generation");
                let _ = std::fs::remove_dir_all(&path);
            }
        }
    }

    /// Cache-first: serve a stored response and revalidate it in the
    /// background; on a miss, go to the network and store the result.
    pub async fn fetch_cache_first(&self, url: &str) -> Option<Value> {
        let dir = self.static_dir();
        if let Some(cached) = read_entry(&dir, url) {
            let transport = Arc::clone(&self.transport);
            let url = url.to_string();
            tokio::spawn(async move {
                // Best effort; a failed refresh leaves the entry as-is.
                if let Some(value) = transport.get_json(&url).await {
                    write_entry(&dir, &url, &value);
                }
            });
            return Some(cached);
        }

        let value = self.transport.get_json(url).await?;
        write_entry(&self.static_dir(), url, &value);
        Some(value)
    }

    /// Network-first: store and return the live response, falling back to
    /// the cache when the network fails.
    pub async fn fetch_network_first(&self, url: &str) -> Option<Value> {
        if let Some(value) = self.transport.get_json(url).await {
            write_entry(&self.api_dir(), url, &value);
            return Some(value);
        }
        read_entry(&self.api_dir(), url)
    }

    /// Delete every cache generation of this store, current included.
    pub fn clear(&self) {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_ours = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&format!("{}-", self.name)))
                    .unwrap_or(false);
            if is_ours {
                let _ = std::fs::remove_dir_all(&path);
            }
        }
    }
}

fn entry_path(dir: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    dir.join(format!("{}.json", hex::encode(hasher.finalize())))
}

fn read_entry(dir: &Path, url: &str) -> Option<Value> {
    let raw = std::fs::read_to_string(entry_path(dir, url)).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_entry(dir: &Path, url: &str, value: &Value) -> bool {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "could not create cache generation dir");
        return false;
    }
    match std::fs::write(entry_path(dir, url), value.to_string()) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(url, error = %e, "could not write offline entry");
            false
        }
    }
}
