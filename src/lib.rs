//! # Corpus Harness
//!
//! Incremental collection of social-media posts into deduplicated,
//! per-topic corpora on disk.
//!
//! Each run fetches a batch of posts per topic, cleans it, merges it into
//! the topic's persisted corpus, and appends the corpus's new unique count
//! to an append-only progress log. The difference against the last logged
//! count is the number of new posts discovered by the run.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────┐   ┌─────────┐   ┌──────────────┐
//! │  Producer  │──▶│  Clean  │──▶│  Merge  │──▶│ CorpusStore  │
//! │ (fetch)    │   │ blank + │   │ concat +│   │ *_merged.csv │
//! └────────────┘   │ dupes   │   │ dedupe  │   │ *_log.csv    │
//!                  └─────────┘   └─────────┘   └──────┬───────┘
//!                                                     │
//!                                   ┌─────────────────┤
//!                                   ▼                 ▼
//!                            ┌─────────────┐   ┌────────────┐
//!                            │ Maintenance │   │   Stats    │
//!                            │   sweep     │   │ leaderboard│
//!                            └─────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! corpus topics                 # show configured topics
//! corpus run                    # one collection cycle + dedupe sweep
//! corpus run --topic GENAI      # a single topic
//! corpus dedupe                 # maintenance sweep only
//! corpus stats                  # per-corpus overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Posts, records, batches, corpus locations |
//! | [`clean`] | Blank and duplicate removal for a batch |
//! | [`merge`] | Batch-into-corpus merge and growth delta |
//! | [`progress_log`] | Append-only unique-count ledger |
//! | [`maintenance`] | Directory-wide dedupe sweep |
//! | [`store`] | Corpus persistence (CSV files, memory) |
//! | [`producer`] | Pluggable post sources |
//! | [`ingest`] | Run orchestration |
//! | [`stats`] | Corpus overview and leaderboard |
//! | [`report`] | Human and JSON output |
//! | [`topics`] | Configured topics and their collection status |
//! | [`error`] | Typed errors of the storage and merge core |

pub mod clean;
pub mod config;
pub mod error;
pub mod ingest;
pub mod maintenance;
pub mod merge;
pub mod models;
pub mod producer;
pub mod progress_log;
pub mod report;
pub mod stats;
pub mod store;
pub mod topics;
