//! Archive statistics overview.
//!
//! Prints the manifest's aggregate counts: total items plus per-status and
//! per-type breakdowns, driven entirely by the manifest's `counts` block.

use anyhow::Result;

use crate::config::Config;

pub async fn run_stats(config: &Config) -> Result<()> {
    let client = config.build_client();
    let manifest = client.manifest().await;

    println!("Archway Archive Stats");
    println!("=====================");
    println!();
    println!("  Archive:     {}", client.repo_url());
    println!("  Manifest:    {}", client.raw_url(&config.archive.index_path));
    println!();
    println!("  Total items: {}", manifest.counts.total_items);
    println!("  Types:       {}", manifest.available_types.len());
    println!("  Indexes:     {}", manifest.indexes.len());

    if !manifest.counts.by_status.is_empty() {
        println!();
        println!("  By status:");
        for (status, count) in &manifest.counts.by_status {
            println!("    {:<16} {:>6}", status, count);
        }
    }

    if !manifest.counts.by_type.is_empty() {
        println!();
        println!("  By type:");
        for (content_type, count) in &manifest.counts.by_type {
            println!("    {:<16} {:>6}", content_type, count);
        }
    }

    if manifest == Default::default() {
        println!();
        println!("  (manifest unavailable, showing empty fallback)");
    }

    Ok(())
}
