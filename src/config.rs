use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::ArchiveOptions;
use crate::persist::DEFAULT_FRESHNESS_SECS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
}

/// Repository coordinates of the archive being browsed.
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    #[serde(default = "default_org")]
    pub org: String,
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

fn default_org() -> String {
    "archway-archive".to_string()
}
fn default_repo() -> String {
    "database".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_index_path() -> String {
    "INDEX.json".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            org: default_org(),
            repo: default_repo(),
            branch: default_branch(),
            index_path: default_index_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Directory for the persisted manifest and offline generations.
    /// Defaults to the platform cache directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Seconds the persisted manifest stays fresh.
    #[serde(default = "default_freshness_secs")]
    pub manifest_freshness_secs: i64,
    /// Persist the manifest across sessions.
    #[serde(default = "default_persist")]
    pub persist_manifest: bool,
}

fn default_freshness_secs() -> i64 {
    DEFAULT_FRESHNESS_SECS
}
fn default_persist() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            manifest_freshness_secs: default_freshness_secs(),
            persist_manifest: default_persist(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Worker-pool width for batch record fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    crate::client::DEFAULT_CONCURRENCY
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OfflineConfig {
    /// Version string naming the cache generations.
    #[serde(default = "default_version")]
    pub version: String,
    /// Static asset URLs prefetched by `archway cache install`.
    #[serde(default)]
    pub assets: Vec<String>,
}

fn default_version() -> String {
    crate::offline::DEFAULT_VERSION.to_string()
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            assets: Vec::new(),
        }
    }
}

impl Config {
    /// A usable default configuration for commands run without a config
    /// file.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Effective cache directory for this configuration.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("archway")
        })
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            org: self.archive.org.clone(),
            repo: self.archive.repo.clone(),
            branch: self.archive.branch.clone(),
            index_path: self.archive.index_path.clone(),
        }
    }

    /// Assemble a client for this configuration, wiring in the persisted
    /// manifest store when enabled.
    pub fn build_client(&self) -> crate::client::ArchiveClient {
        use std::sync::Arc;

        use crate::client::ArchiveClient;
        use crate::persist::ManifestStore;
        use crate::transport::HttpTransport;

        let store = if self.cache.persist_manifest {
            Some(ManifestStore::new(
                self.cache_dir().join("manifest.json"),
                self.cache.manifest_freshness_secs,
            ))
        } else {
            None
        };
        ArchiveClient::with_parts(self.archive_options(), Arc::new(HttpTransport::new()), store)
    }

    /// Offline store for this configuration.
    pub fn build_offline_store(&self) -> crate::offline::OfflineStore {
        use std::sync::Arc;

        use crate::offline::OfflineStore;
        use crate::transport::HttpTransport;

        OfflineStore::new(
            self.cache_dir(),
            "archway",
            self.offline.version.clone(),
            Arc::new(HttpTransport::new()),
        )
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.archive.org.is_empty() {
        anyhow::bail!("archive.org must not be empty");
    }
    if config.archive.repo.is_empty() {
        anyhow::bail!("archive.repo must not be empty");
    }
    if config.archive.branch.is_empty() {
        anyhow::bail!("archive.branch must not be empty");
    }
    if config.archive.index_path.is_empty() {
        anyhow::bail!("archive.index_path must not be empty");
    }
    if config.fetch.concurrency == 0 {
        anyhow::bail!("fetch.concurrency must be >= 1");
    }
    if config.cache.manifest_freshness_secs < 1 {
        anyhow::bail!("cache.manifest_freshness_secs must be >= 1");
    }

    Ok(config)
}
