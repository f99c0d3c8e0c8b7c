//! Log feed: the archive's append-style activity indexes.
//!
//! Resolves a log-kind index definition (by name, or the first one the
//! manifest declares) and prints its entries. The definition's own `limit`
//! bounds the feed unless the caller narrows it further.

use anyhow::Result;

use crate::client::{IndexCriteria, IndexQuery};
use crate::config::Config;
use crate::models::LogEntry;

pub async fn run_log(config: &Config, name: Option<String>, limit: Option<usize>) -> Result<()> {
    let client = config.build_client();
    client.manifest().await;

    let query = match name {
        Some(name) => IndexQuery::Name(name),
        None => IndexCriteria::kind("log").into(),
    };

    let view = client.view(query);
    let Some(def) = view.definition().await else {
        println!("No log index found in this archive.");
        return Ok(());
    };

    let bound = limit.or(def.limit);
    let entries = view.list_entries(bound).await;
    if entries.is_empty() {
        println!("Log '{}' is empty or unavailable.", def.name);
        return Ok(());
    }

    println!("Log: {} ({})", def.name, def.output);
    println!();
    for value in &entries {
        let Some(entry) = LogEntry::from_value(value) else {
            continue;
        };
        let timestamp = entry.timestamp.as_deref().unwrap_or("-");
        let subject = entry
            .content_id
            .as_deref()
            .map(str::to_string)
            .or(entry.pr_number.map(|n| format!("PR #{}", n)))
            .or(entry.source_issue.map(|n| format!("issue #{}", n)))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<22} {:<18} {}", timestamp, entry.event, subject);
    }
    println!();
    println!("{} entries.", entries.len());

    Ok(())
}
