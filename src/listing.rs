//! Database listing: browse, filter, and search archived content.
//!
//! Cross-references the type-grouped and status-grouped index documents
//! into [`ContentItem`]s, then applies the requested filters and prints
//! the result as a table.

use anyhow::Result;

use crate::client::{build_content_items, build_status_map, IndexCriteria};
use crate::config::Config;
use crate::models::ContentItem;

/// Default listing bound.
const DEFAULT_LIMIT: usize = 50;

pub struct ListFilters {
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

pub async fn run_list(config: &Config, filters: &ListFilters) -> Result<()> {
    let client = config.build_client();
    client.manifest().await;

    let by_type = client
        .fetch_index(&IndexCriteria::kind("index").grouped_by("type").into())
        .await;
    let Some(by_type) = by_type else {
        println!("Failed to load the content database.");
        return Ok(());
    };

    let status_map = match client
        .fetch_index(&IndexCriteria::kind("index").grouped_by("status").into())
        .await
    {
        Some(by_status) => build_status_map(&by_status),
        None => Default::default(),
    };

    let items = build_content_items(&by_type, &status_map);
    let total = items.len();

    let filtered: Vec<ContentItem> = items
        .into_iter()
        .filter(|item| {
            filters
                .content_type
                .as_ref()
                .map(|t| &item.content_type == t)
                .unwrap_or(true)
        })
        .filter(|item| {
            filters
                .status
                .as_ref()
                .map(|s| &item.status == s)
                .unwrap_or(true)
        })
        .filter(|item| {
            filters
                .search
                .as_ref()
                .map(|needle| item.matches(needle))
                .unwrap_or(true)
        })
        .take(filters.limit.unwrap_or(DEFAULT_LIMIT))
        .collect();

    if filtered.is_empty() {
        println!("No content found.");
        return Ok(());
    }

    println!("{:<20} {:<12} {:<12}", "ID", "TYPE", "STATUS");
    println!("{}", "-".repeat(46));
    for item in &filtered {
        println!(
            "{:<20} {:<12} {:<12}",
            item.id,
            item.content_type,
            if item.status.is_empty() { "-" } else { &item.status }
        );
    }
    println!();
    println!("Showing {} of {} items.", filtered.len(), total);

    Ok(())
}
