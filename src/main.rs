//! # Archway CLI
//!
//! Terminal browser for manifest-driven JSON archives hosted on GitHub.
//! Everything the commands show is derived from the archive's root
//! manifest: which indexes exist, which content types are available, and
//! how record IDs map to files.
//!
//! ## Usage
//!
//! ```bash
//! archway --config ./archway.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `archway stats` | Aggregate counts by status and type |
//! | `archway list` | Browse and filter the content database |
//! | `archway events` | Timeline of event records |
//! | `archway log` | Append-style activity feed |
//! | `archway get <id>` | Fetch one record by content ID |
//! | `archway url <id>` | Browsable URL of a record file |
//! | `archway sections` | Which sections the manifest enables |
//! | `archway refresh` | Force-reload the manifest |
//! | `archway submit` | Where new content is submitted |
//! | `archway cache install\|clear` | Manage the offline cache |

mod cache;
mod client;
mod config;
mod events;
mod get;
mod listing;
mod logview;
mod models;
mod offline;
mod persist;
mod sections;
mod shard;
mod stats;
mod transport;
mod view;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Archway: browse a manifest-driven JSON archive hosted on GitHub.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; without one, built-in defaults apply.
#[derive(Parser)]
#[command(
    name = "archway",
    about = "A manifest-driven client for static JSON archives on GitHub",
    version,
    long_about = "Archway browses static JSON archives published in public GitHub \
    repositories: a root manifest declares derived indexes, content types, and ID \
    sharding schemas, and every command adapts to what the manifest declares."
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when the file
    /// does not exist.
    #[arg(long, global = true, default_value = "./archway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Show aggregate archive statistics.
    ///
    /// Prints the manifest's total item count and its per-status and
    /// per-type breakdowns.
    Stats,

    /// Browse the content database.
    ///
    /// Cross-references the type-grouped and status-grouped indexes and
    /// prints a filterable listing.
    List {
        /// Only show items of this content type.
        #[arg(long)]
        content_type: Option<String>,

        /// Only show items with this status.
        #[arg(long)]
        status: Option<String>,

        /// Substring search over ID, type, and status.
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of rows (default 50).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the events timeline.
    ///
    /// Fetches full records of type `event`. Available only when the
    /// manifest declares the `event` content type.
    Events {
        /// Maximum number of events to fetch.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show an activity log feed.
    Log {
        /// Log index name (default: the first log-kind index declared).
        #[arg(long)]
        name: Option<String>,

        /// Maximum number of entries (default: the index's declared limit).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Retrieve one record by its content ID.
    Get {
        /// Content ID; its length selects the sharding schema.
        id: String,
    },

    /// Print the browsable URL of a record file.
    Url {
        /// Content ID.
        id: String,
    },

    /// Show which sections this archive's manifest enables.
    Sections,

    /// Force-reload the manifest, replacing any cached copy.
    Refresh,

    /// Print the submission portal URL.
    Submit,

    /// Manage the offline cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Offline cache subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Prefetch the configured static assets into the current cache
    /// generation and sweep old generations.
    Install,

    /// Delete every cache generation and the persisted manifest.
    Clear,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::List {
            content_type,
            status,
            search,
            limit,
        } => {
            let filters = listing::ListFilters {
                content_type,
                status,
                search,
                limit,
            };
            listing::run_list(&cfg, &filters).await?;
        }
        Commands::Events { limit } => {
            events::run_events(&cfg, limit).await?;
        }
        Commands::Log { name, limit } => {
            logview::run_log(&cfg, name, limit).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Url { id } => {
            let client = cfg.build_client();
            client.manifest().await;
            match client.record_url(&id) {
                Some(url) => println!("{}", url),
                None => {
                    eprintln!(
                        "Error: no sharding schema matches an ID of length {}",
                        id.len()
                    );
                    std::process::exit(1);
                }
            }
        }
        Commands::Sections => {
            sections::run_sections(&cfg).await?;
        }
        Commands::Refresh => {
            let client = cfg.build_client();
            let manifest = client.refresh_manifest().await;
            if manifest == Default::default() {
                println!("Manifest refresh failed; empty fallback in effect.");
            } else {
                println!(
                    "Manifest refreshed: {} indexes, {} types, {} items.",
                    manifest.indexes.len(),
                    manifest.available_types.len(),
                    manifest.counts.total_items
                );
            }
        }
        Commands::Submit => {
            let client = cfg.build_client();
            println!("{}", client.submit_url());
        }
        Commands::Cache { action } => match action {
            CacheAction::Install => {
                let store = cfg.build_offline_store();
                store.activate();
                let stored = store.install(&cfg.offline.assets).await;
                println!(
                    "Cached {} of {} assets (generation v{}).",
                    stored,
                    cfg.offline.assets.len(),
                    cfg.offline.version
                );
            }
            CacheAction::Clear => {
                cfg.build_offline_store().clear();
                persist::ManifestStore::new(
                    cfg.cache_dir().join("manifest.json"),
                    cfg.cache.manifest_freshness_secs,
                )
                .clear();
                println!("Caches cleared.");
            }
        },
    }

    Ok(())
}
