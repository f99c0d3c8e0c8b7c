//! Core data models for the archive protocol.
//!
//! Everything the client consumes is plain JSON fetched from a public
//! repository: the root manifest, derived index documents, and per-item
//! record files. All fields are defaulted so a partial or older manifest
//! still deserializes into a usable shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root manifest document, fetched once per session from the archive's
/// well-known index path (e.g. `INDEX.json`).
///
/// The manifest is the contract: index definitions, known content types,
/// and ID sharding schemas are all derived from it rather than hardcoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Ordered index definitions. Names are unique.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Content-type tags known to exist in the archive.
    #[serde(default)]
    pub available_types: Vec<String>,
    /// Sharding schemas, at most one per distinct ID length.
    #[serde(default)]
    pub id_schemas: Vec<IdSchema>,
    /// Aggregate counts, keyed by status and by type.
    #[serde(default)]
    pub counts: Counts,
}

/// A named pointer to one derived JSON artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexDef {
    #[serde(default)]
    pub name: String,
    /// `"index"` for grouped mappings, `"log"` for append-style feeds.
    #[serde(default)]
    pub kind: String,
    /// Grouping dimension for index-kind outputs (e.g. `"type"`, `"status"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Relative path of the output file within the repository.
    #[serde(default)]
    pub output: String,
    /// Declared entry bound for log-kind outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Upstream source tag, when the index is derived from another feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Rule for mapping a content ID to a nested storage path.
///
/// Applies to IDs of exactly `length` characters; there is no fallback or
/// interpolation between lengths.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdSchema {
    #[serde(default)]
    pub length: usize,
    /// Chunk size for splitting the ID into directory segments.
    /// Zero or missing falls back to 2 at resolution time.
    #[serde(default)]
    pub layer_size: usize,
    /// Path prefix under which record files live.
    #[serde(default)]
    pub data_root: String,
}

/// Aggregate numeric summaries from the manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Counts {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
}

/// Full record document for one content item, fetched lazily by ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub payload: Payload,
}

/// Free-form record payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Descriptive key/value fields (title, location, date, ...).
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub job: Job,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
}

impl Record {
    /// Deserialize a record from a raw cached JSON value.
    ///
    /// Records are free-form; anything that is at least a JSON object
    /// parses, missing fields default.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// One entry of a log-kind index output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_issue: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    /// Any additional fields the log carries.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Lightweight listing projection built by cross-referencing a type-grouped
/// index with a status-grouped index. Constructed transiently per listing,
/// never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub content_type: String,
    /// Status from the status index; the authoritative record may later
    /// overwrite it.
    pub status: String,
    /// Lowercase concatenation of the searchable fields.
    pub search_text: String,
}

impl ContentItem {
    pub fn new(id: &str, content_type: &str, status: &str) -> Self {
        let search_text = format!("{} {} {}", id, content_type, status).to_lowercase();
        Self {
            id: id.to_string(),
            content_type: content_type.to_string(),
            status: status.to_string(),
            search_text,
        }
    }

    /// Substring match against the lowercase search text.
    pub fn matches(&self, needle: &str) -> bool {
        self.search_text.contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_manifest_parses() {
        let manifest: Manifest =
            serde_json::from_str(r#"{ "available_types": ["event"] }"#).unwrap();
        assert_eq!(manifest.available_types, vec!["event".to_string()]);
        assert!(manifest.indexes.is_empty());
        assert_eq!(manifest.counts.total_items, 0);
    }

    #[test]
    fn test_record_from_loose_value() {
        let value = serde_json::json!({
            "status": "verified",
            "payload": { "fields": { "title": "march" }, "meta": { "issue_url": "u" } },
            "unknown_field": 1
        });
        let record = Record::from_value(&value).unwrap();
        assert_eq!(record.status, "verified");
        assert_eq!(record.payload.meta.issue_url.as_deref(), Some("u"));
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_content_item_search_text() {
        let item = ContentItem::new("AB12", "Video", "Verified");
        assert!(item.matches("video"));
        assert!(item.matches("ab12"));
        assert!(!item.matches("photo"));
    }
}
