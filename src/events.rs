//! Events timeline.
//!
//! Lists full records of type `event`, fetched through the type-grouped
//! view with the configured worker-pool width. The section is gated on the
//! manifest declaring the `event` content type; nothing here is hardcoded
//! to a particular archive.

use anyhow::Result;

use crate::client::{FetchOptions, IndexCriteria};
use crate::config::Config;
use crate::models::Record;

pub async fn run_events(config: &Config, limit: Option<usize>) -> Result<()> {
    let client = config.build_client();
    client.manifest().await;

    if !client.has_type("event") {
        println!("This archive declares no events.");
        return Ok(());
    }

    let view = client.view(IndexCriteria::kind("index").grouped_by("type"));
    let records = view
        .list_records(
            Some("event"),
            FetchOptions {
                limit,
                concurrency: Some(config.fetch.concurrency),
            },
        )
        .await;

    if records.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    for value in &records {
        let Some(record) = Record::from_value(value) else {
            continue;
        };
        let title = record
            .payload
            .fields
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("(untitled)");
        let date = record
            .payload
            .fields
            .get("date")
            .and_then(|v| v.as_str())
            .or(record.created_at.as_deref())
            .unwrap_or("-");
        println!("{:<12} {:<12} {}", date, record.status, title);
    }
    println!();
    println!("{} events.", records.len());

    Ok(())
}
