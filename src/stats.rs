//! Corpus statistics and leaderboard.
//!
//! Provides a quick summary of what has been collected: rows and unique
//! texts per corpus, file size, and the latest progress log entry. Used by
//! `corpus stats` and by the run summary's community leaderboard.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::Config;
use crate::models::{Batch, CorpusTarget, COMMUNITY, CORPUS_SUFFIX};
use crate::progress_log::{ProgressEntry, ProgressLog};
use crate::report::ReportMode;
use crate::store::{CorpusStore, CsvStore};

/// Per-corpus overview.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub name: String,
    pub rows: usize,
    pub unique_texts: usize,
    pub bytes: Option<u64>,
    pub last_entry: Option<ProgressEntry>,
}

/// Most frequent communities of one corpus.
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub corpus: String,
    pub entries: Vec<(String, usize)>,
}

/// Top `n` values of `field` by count, ties broken by name. Null cells are skipped.
pub fn leaderboard(batch: &Batch, field: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &batch.records {
        if let Some(value) = record.get(field) {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// Leaderboard for `report.leaderboard_corpus`, or `None` when unset or not
/// collected yet.
pub fn load_leaderboard(store: &dyn CorpusStore, config: &Config) -> Result<Option<Leaderboard>> {
    let Some(name) = &config.report.leaderboard_corpus else {
        return Ok(None);
    };
    let target = config.target(name);
    let Some(corpus) = store.load(&target.corpus)? else {
        return Ok(None);
    };
    Ok(Some(Leaderboard {
        corpus: name.clone(),
        entries: leaderboard(&corpus, COMMUNITY, config.report.leaderboard_size),
    }))
}

/// Gather [`CorpusStats`] for every `<name>_merged.csv` in the data directory.
pub fn collect_stats(store: &dyn CorpusStore, config: &Config) -> Result<Vec<CorpusStats>> {
    let text_field = &config.cleaning.text_field;
    let mut stats = Vec::new();

    for path in store.list(&config.data.dir)? {
        let Some(target) = CorpusTarget::from_corpus_path(&path) else {
            continue;
        };
        let Some(mut corpus) = store.load(&target.corpus)? else {
            continue;
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(CORPUS_SUFFIX))
            .unwrap_or_default()
            .to_string();

        let rows = corpus.len();
        if corpus.has_column(text_field) {
            corpus.dedupe_by(text_field);
        }
        let last_entry = ProgressLog::new(store, &target.log).last()?;

        stats.push(CorpusStats {
            name,
            rows,
            unique_texts: corpus.len(),
            bytes: store.size(&path)?,
            last_entry,
        });
    }

    Ok(stats)
}

/// Run the stats command: scan the data directory and print a summary.
pub fn run_stats(config: &Config, mode: ReportMode) -> Result<()> {
    let store = CsvStore::new();
    let stats = collect_stats(&store, config)?;
    let leaderboard = load_leaderboard(&store, config)?;
    mode.reporter().stats(&stats, leaderboard.as_ref());
    Ok(())
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a log timestamp relative to now (e.g. "3 hours ago").
pub fn format_ts_relative(ts: NaiveDateTime) -> String {
    format_ts_relative_to(ts, Local::now().naive_local())
}

fn format_ts_relative_to(ts: NaiveDateTime, now: NaiveDateTime) -> String {
    let delta = (now - ts).num_seconds();

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
