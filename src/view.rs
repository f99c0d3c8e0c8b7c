//! Views: a query surface over one index definition.
//!
//! Index outputs come in two shapes: a grouped mapping (`{ "items": {
//! "<group>": ["<id>", ...] } }`) or a flat log array. The shape is decided
//! once at parse time into the [`IndexDoc`] tagged union; the listing
//! operations are then variant-specific instead of sniffing the JSON on
//! every call.
//!
//! Views hold no state beyond their query: every operation re-resolves and
//! re-fetches the underlying definition, and the session cache absorbs the
//! redundant calls.

use serde_json::Value;

use crate::client::{ArchiveClient, FetchOptions, IndexQuery};
use crate::models::IndexDef;

/// A parsed index document.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDoc {
    Grouped(GroupedIndex),
    Log(LogIndex),
}

/// Keyed mapping of group → member IDs, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedIndex {
    pub groups: Vec<(String, Vec<String>)>,
}

/// Ordered feed of log entries.
#[derive(Debug, Clone, PartialEq)]
pub struct LogIndex {
    pub entries: Vec<Value>,
}

impl IndexDoc {
    /// Decide the document shape once, at parse time.
    ///
    /// An object carrying an `items` object is grouped; a top-level array
    /// is a log; anything else is unusable.
    pub fn parse(value: &Value) -> Option<Self> {
        if let Some(items) = value.get("items").and_then(Value::as_object) {
            let groups = items
                .iter()
                .map(|(group, ids)| {
                    let ids = ids
                        .as_array()
                        .map(|ids| {
                            ids.iter()
                                .filter_map(Value::as_str)
                                .filter(|id| !id.is_empty())
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    (group.clone(), ids)
                })
                .collect();
            return Some(Self::Grouped(GroupedIndex { groups }));
        }
        if let Some(entries) = value.as_array() {
            return Some(Self::Log(LogIndex {
                entries: entries.clone(),
            }));
        }
        None
    }
}

impl GroupedIndex {
    pub fn group_keys(&self) -> Vec<String> {
        self.groups.iter().map(|(group, _)| group.clone()).collect()
    }

    /// IDs of one group, or the flattened IDs of every group.
    pub fn ids(&self, group: Option<&str>) -> Vec<String> {
        match group {
            Some(key) => self
                .groups
                .iter()
                .find(|(group, _)| group == key)
                .map(|(_, ids)| ids.clone())
                .unwrap_or_default(),
            None => self
                .groups
                .iter()
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
        }
    }
}

impl LogIndex {
    /// IDs referenced by entries that carry a `content_id`.
    pub fn content_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.get("content_id").and_then(Value::as_str))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn entries(&self, limit: Option<usize>) -> Vec<Value> {
        let limit = limit.unwrap_or(self.entries.len());
        self.entries.iter().take(limit).cloned().collect()
    }
}

/// Query adapter bound to one index definition.
pub struct View {
    client: ArchiveClient,
    query: IndexQuery,
}

impl View {
    pub fn new(client: ArchiveClient, query: IndexQuery) -> Self {
        Self { client, query }
    }

    /// The definition this view currently resolves to.
    pub async fn definition(&self) -> Option<IndexDef> {
        self.client.resolve_index_def(&self.query).await
    }

    /// Fetch and parse the underlying document.
    pub async fn fetch(&self) -> Option<IndexDoc> {
        let raw = self.client.fetch_index(&self.query).await?;
        IndexDoc::parse(&raw)
    }

    /// Group keys of a grouped document; empty for log documents.
    pub async fn list_groups(&self) -> Vec<String> {
        match self.fetch().await {
            Some(IndexDoc::Grouped(grouped)) => grouped.group_keys(),
            _ => Vec::new(),
        }
    }

    /// Member IDs: per-group or flattened for grouped documents,
    /// `content_id` extraction for log documents.
    pub async fn list_ids(&self, group: Option<&str>) -> Vec<String> {
        match self.fetch().await {
            Some(IndexDoc::Grouped(grouped)) => grouped.ids(group),
            Some(IndexDoc::Log(log)) => log.content_ids(),
            None => Vec::new(),
        }
    }

    /// Raw entries of a log document, bounded by `limit`. Grouped
    /// documents have no entries.
    pub async fn list_entries(&self, limit: Option<usize>) -> Vec<Value> {
        match self.fetch().await {
            Some(IndexDoc::Log(log)) => log.entries(limit),
            _ => Vec::new(),
        }
    }

    /// Fetch the full records behind [`list_ids`](Self::list_ids).
    pub async fn list_records(&self, group: Option<&str>, opts: FetchOptions) -> Vec<Value> {
        let ids = self.list_ids(group).await;
        self.client.fetch_records(&ids, opts).await
    }
}
