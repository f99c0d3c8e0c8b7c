//! End-to-end client tests over a scripted transport.
//!
//! The transport serves canned JSON per URL, records every call, and can
//! delay individual responses to force out-of-order completion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use archway::client::{ArchiveClient, ArchiveOptions, FetchOptions, IndexCriteria, IndexQuery, Section};
use archway::persist::ManifestStore;
use archway::transport::Transport;

const BASE: &str = "https://raw.githubusercontent.com/acme/vault/main";

struct ScriptedTransport {
    responses: HashMap<String, Value>,
    delays_ms: HashMap<String, u64>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delays_ms: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn serve(mut self, path: &str, value: Value) -> Self {
        self.responses.insert(format!("{}/{}", BASE, path), value);
        self
    }

    fn delay(mut self, path: &str, ms: u64) -> Self {
        self.delays_ms.insert(format!("{}/{}", BASE, path), ms);
        self
    }

    fn calls_for(&self, path: &str) -> usize {
        let url = format!("{}/{}", BASE, path);
        self.calls.lock().unwrap().iter().filter(|c| **c == url).count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, url: &str) -> Option<Value> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(ms) = self.delays_ms.get(url) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        self.responses.get(url).cloned()
    }
}

fn options() -> ArchiveOptions {
    ArchiveOptions {
        org: "acme".to_string(),
        repo: "vault".to_string(),
        branch: "main".to_string(),
        index_path: "INDEX.json".to_string(),
    }
}

fn manifest_json() -> Value {
    json!({
        "indexes": [
            { "name": "by-type", "kind": "index", "group_by": "type", "output": "index/by-type.json" },
            { "name": "by-status", "kind": "index", "group_by": "status", "output": "index/by-status.json" },
            { "name": "submissions", "kind": "log", "output": "log/submissions.json", "limit": 2 }
        ],
        "available_types": ["event", "photo"],
        "id_schemas": [
            { "length": 4, "layer_size": 2, "data_root": "content" }
        ],
        "counts": {
            "total_items": 3,
            "by_status": { "verified": 2, "pending": 1 },
            "by_type": { "event": 1, "photo": 2 }
        }
    })
}

fn record_json(id: &str, status: &str) -> Value {
    json!({
        "status": status,
        "created_at": "2024-01-01T00:00:00Z",
        "payload": { "fields": { "title": format!("record {}", id) } }
    })
}

/// Scripted archive with a manifest, both grouped indexes, a log, and
/// three records (abcd, efgh, ijkl).
fn scripted() -> ScriptedTransport {
    ScriptedTransport::new()
        .serve("INDEX.json", manifest_json())
        .serve(
            "index/by-type.json",
            json!({ "items": { "event": ["abcd"], "photo": ["efgh", "ijkl"] } }),
        )
        .serve(
            "index/by-status.json",
            json!({ "items": { "verified": ["abcd", "efgh"], "pending": ["ijkl"] } }),
        )
        .serve(
            "log/submissions.json",
            json!([
                { "event": "submitted", "content_id": "abcd", "timestamp": "2024-01-02" },
                { "event": "merged", "pr_number": 7 },
                { "event": "submitted", "content_id": "ijkl" }
            ]),
        )
        .serve("content/ab/cd/abcd.json", record_json("abcd", "verified"))
        .serve("content/ef/gh/efgh.json", record_json("efgh", "verified"))
        .serve("content/ij/kl/ijkl.json", record_json("ijkl", "pending"))
}

fn client_over(transport: Arc<ScriptedTransport>) -> ArchiveClient {
    ArchiveClient::with_transport(options(), transport)
}

#[tokio::test]
async fn manifest_is_fetched_once_per_session() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    let first = client.manifest().await;
    let second = client.manifest().await;

    assert_eq!(first, second);
    assert_eq!(first.available_types, vec!["event", "photo"]);
    assert_eq!(transport.calls_for("INDEX.json"), 1);
}

#[tokio::test]
async fn manifest_failure_yields_empty_fallback_and_retries() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client_over(transport.clone());

    let manifest = client.manifest().await;
    assert!(manifest.indexes.is_empty());
    assert!(manifest.available_types.is_empty());

    // The failure was not cached: the next call goes back to the network.
    client.manifest().await;
    assert_eq!(transport.calls_for("INDEX.json"), 2);
}

#[tokio::test]
async fn refresh_bypasses_the_session_cache() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    client.manifest().await;
    client.refresh_manifest().await;
    assert_eq!(transport.calls_for("INDEX.json"), 2);
}

#[tokio::test]
async fn index_documents_are_cached_across_calls() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    let query = IndexQuery::name("by-type");
    let first = client.fetch_index(&query).await;
    let second = client.fetch_index(&query).await;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(transport.calls_for("index/by-type.json"), 1);
}

#[tokio::test]
async fn fetch_record_resolves_through_the_sharding_schema() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    let record = client.fetch_record("abcd").await.unwrap();
    assert_eq!(record["status"], "verified");
    assert_eq!(transport.calls_for("content/ab/cd/abcd.json"), 1);

    // No schema matches a 6-char ID: absent, not an error.
    assert!(client.fetch_record("abcdef").await.is_none());
}

#[tokio::test]
async fn fetch_records_preserves_input_order() {
    // efgh resolves long after the others; order must still follow input.
    let transport = Arc::new(scripted().delay("content/ef/gh/efgh.json", 50));
    let client = client_over(transport.clone());

    let ids: Vec<String> = ["abcd", "efgh", "ijkl"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    for concurrency in [1, 3] {
        client.cache().clear();
        let records = client
            .fetch_records(
                &ids,
                FetchOptions {
                    limit: None,
                    concurrency: Some(concurrency),
                },
            )
            .await;
        let titles: Vec<&str> = records
            .iter()
            .map(|r| r["payload"]["fields"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["record abcd", "record efgh", "record ijkl"]);
    }
}

#[tokio::test]
async fn fetch_records_drops_failures_and_honors_limit() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    // "zzzz" routes to a path the transport does not serve.
    let ids: Vec<String> = ["abcd", "zzzz", "ijkl"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let records = client.fetch_records(&ids, FetchOptions::default()).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["payload"]["fields"]["title"], "record abcd");
    assert_eq!(records[1]["payload"]["fields"]["title"], "record ijkl");

    let limited = client
        .fetch_records(
            &ids,
            FetchOptions {
                limit: Some(1),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn grouped_view_lists_groups_ids_and_records() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    let view = client.view(IndexCriteria::kind("index").grouped_by("type"));
    assert_eq!(view.list_groups().await, vec!["event", "photo"]);
    assert_eq!(view.list_ids(Some("photo")).await, vec!["efgh", "ijkl"]);
    assert_eq!(view.list_ids(None).await, vec!["abcd", "efgh", "ijkl"]);
    assert!(view.list_entries(None).await.is_empty());

    let records = view
        .list_records(Some("event"), FetchOptions::default())
        .await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "verified");
}

#[tokio::test]
async fn log_view_lists_entries_and_extracted_ids() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());

    let view = client.view(IndexQuery::name("submissions"));
    let def = view.definition().await.unwrap();
    assert_eq!(def.kind, "log");

    // Entries come back verbatim; the def-declared limit bounds the feed.
    let entries = view.list_entries(def.limit).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["event"], "submitted");

    // ID listing extracts content_id and skips entries without one.
    assert_eq!(view.list_ids(None).await, vec!["abcd", "ijkl"]);
    assert!(view.list_groups().await.is_empty());
}

#[tokio::test]
async fn ad_hoc_definitions_fetch_without_manifest_listing() {
    let transport = Arc::new(
        scripted().serve("custom/extra.json", json!({ "items": { "misc": ["abcd"] } })),
    );
    let client = client_over(transport.clone());

    let view = client.view(archway::models::IndexDef {
        output: "custom/extra.json".to_string(),
        ..Default::default()
    });
    assert_eq!(view.list_ids(None).await, vec!["abcd"]);
}

#[tokio::test]
async fn sections_follow_declared_capabilities() {
    let transport = Arc::new(scripted());
    let client = client_over(transport.clone());
    client.manifest().await;

    assert!(client.has_type("event"));
    assert!(client.enabled_sections().contains(&Section::Events));

    // Same archive without the event type: the section disappears with no
    // other change.
    let mut reduced = manifest_json();
    reduced["available_types"] = json!(["photo"]);
    let transport = Arc::new(ScriptedTransport::new().serve("INDEX.json", reduced));
    let client = client_over(transport);
    client.manifest().await;

    assert!(!client.has_type("event"));
    assert!(!client.enabled_sections().contains(&Section::Events));
    assert!(client.enabled_sections().contains(&Section::Database));
}

#[tokio::test]
async fn fresh_persisted_manifest_avoids_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");

    let seeded: archway::models::Manifest = serde_json::from_value(manifest_json()).unwrap();
    ManifestStore::new(&path, 60).store(&seeded);

    let transport = Arc::new(ScriptedTransport::new());
    let client = ArchiveClient::with_parts(
        options(),
        transport.clone(),
        Some(ManifestStore::new(&path, 60)),
    );

    let manifest = client.manifest().await;
    assert_eq!(manifest.available_types, vec!["event", "photo"]);
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn network_manifest_is_persisted_for_the_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");

    let transport = Arc::new(scripted());
    let client = ArchiveClient::with_parts(
        options(),
        transport.clone(),
        Some(ManifestStore::new(&path, 60)),
    );
    client.manifest().await;
    assert_eq!(transport.calls_for("INDEX.json"), 1);

    // A second session reuses the envelope while it is fresh.
    let offline = Arc::new(ScriptedTransport::new());
    let next = ArchiveClient::with_parts(
        options(),
        offline.clone(),
        Some(ManifestStore::new(&path, 60)),
    );
    let manifest = next.manifest().await;
    assert_eq!(manifest.counts.total_items, 3);
    assert_eq!(offline.total_calls(), 0);
}

#[tokio::test]
async fn record_urls_point_at_the_browsable_tree() {
    let transport = Arc::new(scripted());
    let client = client_over(transport);
    client.manifest().await;

    assert_eq!(
        client.record_url("abcd").as_deref(),
        Some("https://github.com/acme/vault/blob/main/content/ab/cd/abcd.json")
    );
    assert!(client.record_url("too-long-id").is_none());
    assert_eq!(
        client.submit_url(),
        "https://github.com/acme/vault/issues/new/choose"
    );
}
