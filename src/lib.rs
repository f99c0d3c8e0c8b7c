//! # Archway
//!
//! A manifest-driven client for browsing static JSON archives hosted on
//! GitHub.
//!
//! An archive is a public repository of small JSON files: a root manifest
//! (`INDEX.json`) declares derived index documents, the content types that
//! exist, and how record IDs shard into a nested directory tree. Archway
//! treats the manifest as the contract, nothing else is hardcoded, and
//! layers caching, batched record retrieval, and offline storage on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐   ┌───────────┐
//! │   CLI     │──▶│ ArchiveClient │──▶│ JsonCache │──▶│ Transport │
//! │ commands  │   │ + Views       │   │ + persist │   │ (reqwest) │
//! └──────────┘   └───────┬───────┘   └───────────┘   └───────────┘
//!                        │
//!                        ▼
//!                  ┌───────────┐
//!                  │  shard     │  ID → record path
//!                  └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archway::client::{ArchiveClient, ArchiveOptions, FetchOptions, IndexCriteria};
//!
//! # async fn example() {
//! let client = ArchiveClient::new(ArchiveOptions::default());
//! let manifest = client.manifest().await;
//! println!("{} content types", manifest.available_types.len());
//!
//! let view = client.view(IndexCriteria::kind("index").grouped_by("type"));
//! let records = view
//!     .list_records(Some("event"), FetchOptions { limit: Some(20), ..Default::default() })
//!     .await;
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Manifest, index, and record data types |
//! | [`shard`] | ID-to-path sharding resolver |
//! | [`transport`] | HTTP seam (trait + reqwest implementation) |
//! | [`cache`] | Session JSON cache with single-flight misses |
//! | [`persist`] | Durable manifest envelope with a freshness window |
//! | [`client`] | The archive session: resolution, records, capabilities |
//! | [`view`] | Query adapters over grouped and log index documents |
//! | [`offline`] | Versioned offline response store |
//! | [`config`] | TOML configuration parsing |

pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod offline;
pub mod persist;
pub mod shard;
pub mod transport;
pub mod view;
