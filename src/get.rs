//! Record retrieval by content ID.
//!
//! Resolves the ID through the manifest's sharding schemas, fetches the
//! record file, and prints its typed fields plus the browsable source URL.

use anyhow::Result;

use crate::config::Config;
use crate::models::Record;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let client = config.build_client();
    client.manifest().await;

    let Some(value) = client.fetch_record(id).await else {
        if client.record_path(id).is_none() {
            eprintln!("Error: no sharding schema matches an ID of length {}", id.len());
        } else {
            eprintln!("Error: record not found: {}", id);
        }
        std::process::exit(1);
    };

    let record = Record::from_value(&value).unwrap_or_default();

    println!("--- Record ---");
    println!("id:          {}", id);
    println!("status:      {}", record.status);
    if let Some(ref created) = record.created_at {
        println!("created_at:  {}", created);
    }
    if let Some(ref modified) = record.modified_at {
        println!("modified_at: {}", modified);
    }
    if let Some(url) = client.record_url(id) {
        println!("source:      {}", url);
    }
    if let Some(ref issue) = record.payload.meta.issue_url {
        println!("issue:       {}", issue);
    }
    if let Some(ref output) = record.payload.job.output {
        println!("output:      {}", output);
    }

    if !record.payload.fields.is_empty() {
        println!();
        println!("--- Fields ---");
        for (key, field) in &record.payload.fields {
            println!("{}: {}", key, field);
        }
    }

    Ok(())
}
