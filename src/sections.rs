//! Capability discovery report.
//!
//! Shows which sections the manifest enables and why. A section appears
//! only when its data dependency is declared; removing a type or an index
//! from the manifest turns its section off with no code change.

use anyhow::Result;

use crate::client::Section;
use crate::config::Config;

pub async fn run_sections(config: &Config) -> Result<()> {
    let client = config.build_client();
    let manifest = client.manifest().await;

    println!("Enabled sections:");
    for section in client.enabled_sections() {
        let note = match section {
            Section::Home => "always on".to_string(),
            Section::Database => "type-grouped index declared".to_string(),
            Section::Events => "'event' in available_types".to_string(),
            Section::Stats => "status index or counts declared".to_string(),
            Section::Log => "log-kind index declared".to_string(),
            Section::Submit => client.submit_url(),
        };
        println!("  {:<10} {}", section.to_string(), note);
    }

    if !manifest.available_types.is_empty() {
        println!();
        println!("Available types: {}", manifest.available_types.join(", "));
    }
    if !manifest.indexes.is_empty() {
        println!();
        println!("Declared indexes:");
        for def in &manifest.indexes {
            println!(
                "  {:<16} kind={:<6} group_by={:<8} -> {}",
                def.name,
                def.kind,
                def.group_by.as_deref().unwrap_or("-"),
                def.output
            );
        }
    }

    Ok(())
}
