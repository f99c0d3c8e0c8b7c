//! The archive client: manifest lifecycle, index resolution, and record
//! retrieval.
//!
//! [`ArchiveClient`] is an explicit session object holding the configured
//! repository coordinates, the JSON cache, and the loaded manifest. It is
//! cheap to clone (shared inner state), so independent clients can coexist
//! in one process and workers can carry their own handle.
//!
//! Every operation derives its behavior from the manifest: which index
//! files exist, which content types are available, and how record IDs map
//! to file paths. Nothing is hardcoded beyond the manifest's own location.
//!
//! Failure semantics follow the cache layer: operations are total and
//! signal "unavailable" with `None` or an empty collection, never an error.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::task::JoinSet;

use crate::cache::JsonCache;
use crate::models::{ContentItem, IdSchema, IndexDef, Manifest};
use crate::persist::ManifestStore;
use crate::shard;
use crate::transport::{HttpTransport, Transport};
use crate::view::View;

/// Default worker-pool width for [`ArchiveClient::fetch_records`].
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Repository coordinates for one archive.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// GitHub organization (or user) hosting the archive repositories.
    pub org: String,
    /// Repository holding the manifest and record tree.
    pub repo: String,
    pub branch: String,
    /// Well-known manifest path within the repository.
    pub index_path: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            org: "archway".to_string(),
            repo: "database".to_string(),
            branch: "main".to_string(),
            index_path: "INDEX.json".to_string(),
        }
    }
}

/// How to locate an index definition.
///
/// A query is a name string, a partial-criteria match, or a literal
/// definition; the three cases are explicit variants.
#[derive(Debug, Clone)]
pub enum IndexQuery {
    /// Look up by exact definition name.
    Name(String),
    /// Match manifest definitions against partial criteria; falls back to
    /// an ad hoc literal definition when unmatched but an output is given.
    Criteria(IndexCriteria),
    /// Use this definition as-is (re-resolved by name when it names a
    /// manifest-listed definition).
    Literal(IndexDef),
}

impl IndexQuery {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl From<&str> for IndexQuery {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<IndexDef> for IndexQuery {
    fn from(def: IndexDef) -> Self {
        Self::Literal(def)
    }
}

impl From<IndexCriteria> for IndexQuery {
    fn from(criteria: IndexCriteria) -> Self {
        Self::Criteria(criteria)
    }
}

/// Partial match criteria over index definitions. Absent fields are
/// wildcards; every provided field must match exactly.
#[derive(Debug, Clone, Default)]
pub struct IndexCriteria {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub group_by: Option<String>,
    pub output: Option<String>,
    pub source: Option<String>,
}

impl IndexCriteria {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn grouped_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    fn matches(&self, def: &IndexDef) -> bool {
        if let Some(ref name) = self.name {
            if &def.name != name {
                return false;
            }
        }
        if let Some(ref kind) = self.kind {
            if &def.kind != kind {
                return false;
            }
        }
        if let Some(ref group_by) = self.group_by {
            if def.group_by.as_ref() != Some(group_by) {
                return false;
            }
        }
        if let Some(ref output) = self.output {
            if &def.output != output {
                return false;
            }
        }
        if let Some(ref source) = self.source {
            if def.source.as_ref() != Some(source) {
                return false;
            }
        }
        true
    }

    /// Promote unmatched criteria into an ad hoc definition. Only sensible
    /// when an output path is present.
    fn into_def(self) -> IndexDef {
        IndexDef {
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            group_by: self.group_by,
            output: self.output.unwrap_or_default(),
            limit: None,
            source: self.source,
        }
    }
}

/// Options for [`ArchiveClient::fetch_records`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Fetch at most this many IDs from the front of the list. `None`
    /// means all of them.
    pub limit: Option<usize>,
    /// Worker-pool width; capped at the number of IDs. `None` means
    /// [`DEFAULT_CONCURRENCY`].
    pub concurrency: Option<usize>,
}

/// UI sections the rendering shell may enable. Enablement is capability
/// discovery against the manifest, not hardcoded routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Database,
    Events,
    Stats,
    Log,
    Submit,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Home => "home",
            Section::Database => "database",
            Section::Events => "events",
            Section::Stats => "stats",
            Section::Log => "log",
            Section::Submit => "submit",
        };
        f.write_str(name)
    }
}

struct ClientInner {
    options: ArchiveOptions,
    cache: JsonCache,
    manifest: RwLock<Option<Manifest>>,
    store: Option<ManifestStore>,
}

/// Session handle for one archive.
#[derive(Clone)]
pub struct ArchiveClient {
    inner: Arc<ClientInner>,
}

impl ArchiveClient {
    /// Client over the production HTTP transport, no durable manifest cache.
    pub fn new(options: ArchiveOptions) -> Self {
        Self::with_parts(options, Arc::new(HttpTransport::new()), None)
    }

    /// Client with a custom transport (tests script fetches through this).
    pub fn with_transport(options: ArchiveOptions, transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(options, transport, None)
    }

    /// Fully assembled client, optionally persisting the manifest to disk.
    pub fn with_parts(
        options: ArchiveOptions,
        transport: Arc<dyn Transport>,
        store: Option<ManifestStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                options,
                cache: JsonCache::new(transport),
                manifest: RwLock::new(None),
                store,
            }),
        }
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.inner.options
    }

    pub fn cache(&self) -> &JsonCache {
        &self.inner.cache
    }

    // ============ URLs ============

    /// Raw-content URL for a path in the configured repository.
    pub fn raw_url(&self, path: &str) -> String {
        self.raw_url_in(&self.inner.options.repo, path)
    }

    /// Raw-content URL for a path in a sibling repository of the same org.
    pub fn raw_url_in(&self, repo: &str, path: &str) -> String {
        let o = &self.inner.options;
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            o.org, repo, o.branch, path
        )
    }

    /// Human-browsable URL for a path in the configured repository.
    pub fn browse_url(&self, path: &str) -> String {
        let o = &self.inner.options;
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            o.org, o.repo, o.branch, path
        )
    }

    pub fn repo_url(&self) -> String {
        let o = &self.inner.options;
        format!("https://github.com/{}/{}", o.org, o.repo)
    }

    pub fn org_url(&self) -> String {
        format!("https://github.com/{}", self.inner.options.org)
    }

    /// Issue-template chooser where new content is submitted.
    pub fn submit_url(&self) -> String {
        format!("{}/issues/new/choose", self.repo_url())
    }

    // ============ Raw fetches ============

    /// Uncached JSON fetch from the configured repository.
    pub async fn fetch_json(&self, path: &str) -> Option<Value> {
        self.inner.cache.fetch_json(&self.raw_url(path)).await
    }

    /// Cached JSON fetch from the configured repository.
    pub async fn fetch_json_cached(&self, path: &str) -> Option<Value> {
        let repo = self.inner.options.repo.clone();
        self.fetch_json_cached_in(&repo, path).await
    }

    /// Cached JSON fetch from a sibling repository of the same org.
    pub async fn fetch_json_cached_in(&self, repo: &str, path: &str) -> Option<Value> {
        let url = self.raw_url_in(repo, path);
        self.inner.cache.fetch_json_cached(repo, path, &url).await
    }

    // ============ Manifest lifecycle ============

    /// Return the manifest, loading it on first call.
    ///
    /// Resolution order: in-memory slot, fresh persisted envelope, network.
    /// When everything fails the empty manifest is returned (well-formed,
    /// so downstream code never shape-checks), but the slot stays unloaded
    /// and the next call retries.
    pub async fn manifest(&self) -> Manifest {
        if let Some(manifest) = self.cached_manifest() {
            return manifest;
        }

        if let Some(store) = &self.inner.store {
            if let Some(manifest) = store.load_fresh() {
                tracing::debug!("manifest served from persisted envelope");
                self.set_manifest(manifest.clone());
                return manifest;
            }
        }

        match self.fetch_manifest_from_network(false).await {
            Some(manifest) => manifest,
            None => Manifest::default(),
        }
    }

    /// Force a reload from the network, replacing the stored manifest and
    /// its cache entry wholesale.
    pub async fn refresh_manifest(&self) -> Manifest {
        match self.fetch_manifest_from_network(true).await {
            Some(manifest) => manifest,
            None => Manifest::default(),
        }
    }

    async fn fetch_manifest_from_network(&self, force: bool) -> Option<Manifest> {
        let o = &self.inner.options;
        let url = self.raw_url(&o.index_path);

        let value = if force {
            self.inner.cache.fetch_json(&url).await
        } else {
            self.inner
                .cache
                .fetch_json_cached(&o.repo, &o.index_path, &url)
                .await
        };

        let manifest: Manifest = serde_json::from_value(value?).ok()?;
        if let Some(store) = &self.inner.store {
            store.store(&manifest);
        }
        self.set_manifest(manifest.clone());
        Some(manifest)
    }

    /// Replace the loaded manifest without touching the network.
    pub fn set_manifest(&self, manifest: Manifest) {
        *self.inner.manifest.write().expect("manifest lock poisoned") = Some(manifest);
    }

    /// The loaded manifest, if this session has one.
    pub fn cached_manifest(&self) -> Option<Manifest> {
        self.inner
            .manifest
            .read()
            .expect("manifest lock poisoned")
            .clone()
    }

    // ============ Index resolution ============

    /// All index definitions declared by the loaded manifest.
    pub fn list_index_defs(&self) -> Vec<IndexDef> {
        self.cached_manifest()
            .map(|m| m.indexes)
            .unwrap_or_default()
    }

    /// First loaded definition satisfying `criteria`.
    pub fn find_index(&self, criteria: &IndexCriteria) -> Option<IndexDef> {
        self.list_index_defs()
            .into_iter()
            .find(|def| criteria.matches(def))
    }

    /// Resolve a query to a concrete definition, loading the manifest if
    /// needed. Returns `None` when unresolvable.
    pub async fn resolve_index_def(&self, query: &IndexQuery) -> Option<IndexDef> {
        let manifest = self.manifest().await;
        resolve_in(&manifest, query)
    }

    /// The output path a query resolves to, when any.
    pub async fn index_output(&self, query: &IndexQuery) -> Option<String> {
        let def = self.resolve_index_def(query).await?;
        if def.output.is_empty() {
            None
        } else {
            Some(def.output)
        }
    }

    /// Resolve and fetch an index document.
    pub async fn fetch_index(&self, query: &IndexQuery) -> Option<Value> {
        let output = self.index_output(query).await?;
        self.fetch_json_cached(&output).await
    }

    /// Whether the loaded manifest declares an index with this name.
    pub fn has_index(&self, name: &str) -> bool {
        self.list_index_defs().iter().any(|def| def.name == name)
    }

    /// Whether the loaded manifest declares this content type.
    pub fn has_type(&self, content_type: &str) -> bool {
        self.cached_manifest()
            .map(|m| m.available_types.iter().any(|t| t == content_type))
            .unwrap_or(false)
    }

    /// Sections the loaded manifest's capabilities enable.
    pub fn enabled_sections(&self) -> Vec<Section> {
        let manifest = self.cached_manifest().unwrap_or_default();
        let mut sections = vec![Section::Home];

        let has_type_index = manifest
            .indexes
            .iter()
            .any(|def| def.group_by.as_deref() == Some("type"));
        let has_status_index = manifest
            .indexes
            .iter()
            .any(|def| def.group_by.as_deref() == Some("status"));
        let has_log = manifest.indexes.iter().any(|def| def.kind == "log");

        if has_type_index {
            sections.push(Section::Database);
        }
        if manifest.available_types.iter().any(|t| t == "event") {
            sections.push(Section::Events);
        }
        if has_status_index || !manifest.counts.by_type.is_empty() {
            sections.push(Section::Stats);
        }
        if has_log {
            sections.push(Section::Log);
        }
        sections.push(Section::Submit);
        sections
    }

    // ============ Records ============

    /// Sharding schema for an ID, by exact length match on the loaded
    /// manifest.
    pub fn schema_for_id(&self, id: &str) -> Option<IdSchema> {
        let manifest = self.cached_manifest()?;
        shard::schema_for_id(id, &manifest.id_schemas).cloned()
    }

    /// Relative record path for an ID. `None` means the ID is unroutable
    /// (no schema matches its length).
    pub fn record_path(&self, id: &str) -> Option<String> {
        let schema = self.schema_for_id(id)?;
        Some(shard::id_to_path(id, &schema))
    }

    /// Browsable URL of the record file behind an ID.
    pub fn record_url(&self, id: &str) -> Option<String> {
        Some(self.browse_url(&self.record_path(id)?))
    }

    /// Fetch one record by ID. `None` when the ID is unroutable or the
    /// fetch fails.
    pub async fn fetch_record(&self, id: &str) -> Option<Value> {
        if self.cached_manifest().is_none() {
            self.manifest().await;
        }
        let path = self.record_path(id)?;
        self.fetch_json_cached(&path).await
    }

    /// Fetch up to `limit` records through a bounded worker pool.
    ///
    /// Workers pull IDs from a shared cursor; results are written into
    /// positional slots so output order matches input order regardless of
    /// completion order. The call resolves once every worker finishes
    /// (join-all, no cancellation). Failed fetches are silently dropped
    /// from the result.
    pub async fn fetch_records(&self, ids: &[String], opts: FetchOptions) -> Vec<Value> {
        let limit = opts.limit.unwrap_or(ids.len()).min(ids.len());
        let list: Arc<Vec<String>> = Arc::new(ids[..limit].to_vec());
        if list.is_empty() {
            return Vec::new();
        }

        let concurrency = opts.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1);
        let workers = concurrency.min(list.len());
        let cursor = Arc::new(AtomicUsize::new(0));

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let client = self.clone();
            let list = Arc::clone(&list);
            let cursor = Arc::clone(&cursor);
            pool.spawn(async move {
                let mut fetched: Vec<(usize, Option<Value>)> = Vec::new();
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= list.len() {
                        break;
                    }
                    let record = client.fetch_record(&list[index]).await;
                    fetched.push((index, record));
                }
                fetched
            });
        }

        let mut slots: Vec<Option<Value>> = vec![None; list.len()];
        while let Some(joined) = pool.join_next().await {
            if let Ok(batch) = joined {
                for (index, record) in batch {
                    slots[index] = record;
                }
            }
        }

        slots.into_iter().flatten().collect()
    }

    // ============ Views ============

    /// A view over one index definition query.
    pub fn view(&self, query: impl Into<IndexQuery>) -> View {
        View::new(self.clone(), query.into())
    }

    /// One view per manifest-declared index definition.
    pub fn views(&self) -> Vec<View> {
        self.list_index_defs()
            .into_iter()
            .map(|def| self.view(def))
            .collect()
    }
}

/// Resolve a query against a manifest snapshot.
fn resolve_in(manifest: &Manifest, query: &IndexQuery) -> Option<IndexDef> {
    let by_name = |name: &str| {
        manifest
            .indexes
            .iter()
            .find(|def| def.name == name)
            .cloned()
    };

    match query {
        IndexQuery::Name(name) => by_name(name),
        IndexQuery::Criteria(criteria) => {
            if let Some(ref name) = criteria.name {
                if let Some(def) = by_name(name) {
                    return Some(def);
                }
            }
            if let Some(def) = manifest.indexes.iter().find(|def| criteria.matches(def)) {
                return Some(def.clone());
            }
            if criteria.output.is_some() {
                return Some(criteria.clone().into_def());
            }
            None
        }
        IndexQuery::Literal(def) => {
            if !def.name.is_empty() {
                if let Some(named) = by_name(&def.name) {
                    return Some(named);
                }
            }
            Some(def.clone())
        }
    }
}

// ============ Listing projections ============

/// Invert a status-grouped index document into an ID → status map.
pub fn build_status_map(by_status: &Value) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Some(items) = by_status.get("items").and_then(Value::as_object) else {
        return map;
    };
    for (status, ids) in items {
        let Some(ids) = ids.as_array() else { continue };
        for id in ids.iter().filter_map(Value::as_str) {
            map.insert(id.to_string(), status.clone());
        }
    }
    map
}

/// Cross-reference a type-grouped index with a status map into listing
/// items. IDs appearing under several types keep the first type
/// encountered (first-write-wins, document order).
pub fn build_content_items(
    by_type: &Value,
    status_map: &HashMap<String, String>,
) -> Vec<ContentItem> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let Some(groups) = by_type.get("items").and_then(Value::as_object) else {
        return items;
    };
    for (content_type, ids) in groups {
        let Some(ids) = ids.as_array() else { continue };
        for id in ids.iter().filter_map(Value::as_str) {
            if id.is_empty() || !seen.insert(id.to_string()) {
                continue;
            }
            let status = status_map.get(id).map(String::as_str).unwrap_or("");
            items.push(ContentItem::new(id, content_type, status));
        }
    }
    items
}
