//! # Corpus Harness CLI (`corpus`)
//!
//! The `corpus` binary runs collection cycles, maintenance sweeps, and
//! corpus overviews against the data directory named in the config file.
//!
//! ## Usage
//!
//! ```bash
//! corpus --config ./config/corpus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `corpus run` | Fetch, clean, and merge every topic, then dedupe |
//! | `corpus dedupe` | Deduplicate every corpus in the data directory |
//! | `corpus stats` | Rows, unique texts, and last log entry per corpus |
//! | `corpus topics` | List configured topics and their corpora |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corpus_harness::report::ReportMode;
use corpus_harness::{config, ingest, stats, topics};

/// Corpus Harness: incremental, deduplicated post corpora.
#[derive(Parser)]
#[command(
    name = "corpus",
    about = "Collect posts into deduplicated per-topic corpora",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/corpus.toml")]
    config: PathBuf,

    /// Report format on stdout.
    #[arg(long, global = true, value_enum, default_value = "human")]
    format: ReportMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection cycle.
    ///
    /// Fetches each topic's posts, removes blank and duplicate texts,
    /// merges them into the topic's corpus, and appends the new unique
    /// count to its progress log. Runs the dedupe sweep afterwards unless
    /// disabled.
    Run {
        /// Only collect this topic label.
        #[arg(long)]
        topic: Option<String>,

        /// Skip the maintenance sweep after collection.
        #[arg(long)]
        skip_dedupe: bool,
    },

    /// Deduplicate every corpus in the data directory by ID, then by text.
    Dedupe,

    /// Show per-corpus counts and the community leaderboard.
    Stats,

    /// List configured topics and whether their corpora exist.
    Topics,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(atty::is(atty::Stream::Stderr))
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run { topic, skip_dedupe } => {
            ingest::run_collect(&cfg, topic.as_deref(), skip_dedupe, cli.format).await?;
        }
        Commands::Dedupe => {
            ingest::run_dedupe(&cfg, cli.format)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg, cli.format)?;
        }
        Commands::Topics => {
            topics::list_topics(&cfg, cli.format)?;
        }
    }

    Ok(())
}
