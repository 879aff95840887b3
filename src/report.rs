//! Run, sweep, and stats reporting.
//!
//! Reports go to **stdout**: a labelled human summary, or one JSON object
//! per line for scripts. Diagnostics go through `tracing` on stderr.

use serde_json::json;

use crate::ingest::{RunSummary, TopicReport};
use crate::maintenance::SweepReport;
use crate::stats::{format_bytes, format_ts_relative, CorpusStats, Leaderboard};
use crate::topics::TopicStatus;

/// Renders reports for the CLI.
pub trait Reporter {
    fn topic(&self, report: &TopicReport);
    fn topic_failed(&self, label: &str, error: &anyhow::Error);
    fn sweep(&self, report: &SweepReport);
    fn sweep_failed(&self, error: &anyhow::Error);
    fn summary(&self, summary: &RunSummary, leaderboard: Option<&Leaderboard>);
    fn stats(&self, stats: &[CorpusStats], leaderboard: Option<&Leaderboard>);
    fn topics(&self, topics: &[TopicStatus]);
}

/// Human-friendly report: "GENAI: +12 new posts (raw: 1,034, unique: 8,211)".
pub struct HumanReport;

impl Reporter for HumanReport {
    fn topic(&self, report: &TopicReport) {
        println!("collect {}", report.label);
        for source in &report.sources {
            let m = &source.merge;
            println!("  corpus {}", source.corpus);
            println!("    raw collected:        {}", format_number(m.raw_total as u64));
            println!("    removed blank:        {}", format_number(source.clean.removed_blank as u64));
            println!("    removed duplicates:   {}", format_number(source.clean.removed_duplicate as u64));
            println!("    corpus before merge:  {}", format_number(m.pre_merge_corpus_size as u64));
            println!("    unique after merge:   {}", format_number(m.final_unique_count as u64));
            println!("    new posts:            {}", m.new_posts);
        }
        for failure in &report.failed {
            println!("  corpus {}", failure.corpus);
            println!("    FAILED: {}", failure.error);
        }
    }

    fn topic_failed(&self, label: &str, error: &anyhow::Error) {
        println!("collect {}", label);
        println!("  FAILED: {:#}", error);
    }

    fn sweep(&self, report: &SweepReport) {
        println!("dedupe");
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(stats) => println!(
                    "  {}: {} -> {} (-{})",
                    stats.name,
                    format_number(stats.size_before as u64),
                    format_number(stats.size_after as u64),
                    format_number(stats.removed() as u64)
                ),
                Err(e) => println!("  {}: FAILED: {}", outcome.name, e),
            }
        }
    }

    fn sweep_failed(&self, error: &anyhow::Error) {
        println!("dedupe");
        println!("  FAILED: {:#}", error);
    }

    fn summary(&self, summary: &RunSummary, leaderboard: Option<&Leaderboard>) {
        println!("summary");
        for outcome in &summary.topics {
            match &outcome.result {
                Ok(report) => {
                    let failed = match report.failed.len() {
                        0 => String::new(),
                        n => format!(", {} failed", n),
                    };
                    println!(
                        "  {}: {} new posts (raw: {}, unique: {}){}",
                        report.label,
                        report.new_posts(),
                        format_number(report.raw_total() as u64),
                        format_number(report.final_unique() as u64),
                        failed
                    )
                }
                Err(_) => println!("  {}: failed", outcome.label),
            }
        }
        if let Some(board) = leaderboard {
            print_leaderboard(board);
        }
        println!("ok");
    }

    fn stats(&self, stats: &[CorpusStats], leaderboard: Option<&Leaderboard>) {
        println!(
            "  {:<24} {:>8} {:>8} {:>10}   {}",
            "CORPUS", "ROWS", "UNIQUE", "SIZE", "LAST LOGGED"
        );
        println!("  {}", "-".repeat(76));
        for s in stats {
            let size = s.bytes.map(format_bytes).unwrap_or_else(|| "-".to_string());
            let logged = match &s.last_entry {
                Some(entry) => format!(
                    "{} ({})",
                    format_number(entry.unique_texts),
                    format_ts_relative(entry.timestamp)
                ),
                None => "never".to_string(),
            };
            println!(
                "  {:<24} {:>8} {:>8} {:>10}   {}",
                s.name,
                format_number(s.rows as u64),
                format_number(s.unique_texts as u64),
                size,
                logged
            );
        }
        if let Some(board) = leaderboard {
            println!();
            print_leaderboard(board);
        }
    }

    fn topics(&self, topics: &[TopicStatus]) {
        println!("{:<16} {:<12} {:<28} STATUS", "TOPIC", "KIND", "CORPUS");
        for t in topics {
            let status = if t.collected { "COLLECTED" } else { "NOT COLLECTED" };
            println!("{:<16} {:<12} {:<28} {}", t.label, t.kind, t.corpus, status);
        }
    }
}

fn print_leaderboard(board: &Leaderboard) {
    println!("top communities ({})", board.corpus);
    for (i, (community, count)) in board.entries.iter().enumerate() {
        println!("  {:>2}. {:<25} {} posts", i + 1, community, format_number(*count as u64));
    }
}

/// Machine-readable report: one JSON object per line on stdout.
pub struct JsonReport;

impl JsonReport {
    fn emit(value: serde_json::Value) {
        if let Ok(line) = serde_json::to_string(&value) {
            println!("{}", line);
        }
    }
}

impl Reporter for JsonReport {
    fn topic(&self, report: &TopicReport) {
        Self::emit(json!({
            "event": "topic",
            "label": report.label,
            "raw_total": report.raw_total(),
            "new_posts": report.new_posts().signed(),
            "sources": report.sources,
            "failed": report.failed,
        }));
    }

    fn topic_failed(&self, label: &str, error: &anyhow::Error) {
        Self::emit(json!({
            "event": "topic_failed",
            "label": label,
            "error": format!("{:#}", error),
        }));
    }

    fn sweep(&self, report: &SweepReport) {
        let files: Vec<serde_json::Value> = report
            .outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(stats) => json!(stats),
                Err(e) => json!({ "name": o.name, "error": e.to_string() }),
            })
            .collect();
        Self::emit(json!({ "event": "dedupe", "files": files }));
    }

    fn sweep_failed(&self, error: &anyhow::Error) {
        Self::emit(json!({
            "event": "dedupe_failed",
            "error": format!("{:#}", error),
        }));
    }

    fn summary(&self, summary: &RunSummary, leaderboard: Option<&Leaderboard>) {
        Self::emit(json!({
            "event": "summary",
            "new_posts": summary.new_posts().signed(),
            "topics": summary.topics.len(),
            "failures": summary.failures(),
            "failed_corpora": summary.failed_sources(),
            "leaderboard": leaderboard,
        }));
    }

    fn stats(&self, stats: &[CorpusStats], leaderboard: Option<&Leaderboard>) {
        Self::emit(json!({
            "event": "stats",
            "corpora": stats,
            "leaderboard": leaderboard,
        }));
    }

    fn topics(&self, topics: &[TopicStatus]) {
        Self::emit(json!({ "event": "topics", "topics": topics }));
    }
}

/// Output format for the CLI: human (default) or JSON.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ReportMode {
    Human,
    Json,
}

impl ReportMode {
    pub fn reporter(&self) -> Box<dyn Reporter> {
        match self {
            ReportMode::Human => Box::new(HumanReport),
            ReportMode::Json => Box::new(JsonReport),
        }
    }
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
