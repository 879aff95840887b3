//! Out-of-band dedupe sweep over every corpus in a directory.
//!
//! Each matching corpus is deduplicated by identifier (when that column
//! exists) and then by text, and overwritten in place. Files are processed
//! independently: a failure is recorded in the report and the sweep moves on.
//!
//! By default the sweep leaves progress logs alone, so a shrink it causes
//! surfaces as a negative delta on the next merge. Set
//! [`SweepOptions::update_progress_log`] to re-baseline the companion log
//! instead.

use chrono::NaiveDateTime;
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::path::Path;

use crate::error::{CorpusError, Result};
use crate::models::{CorpusTarget, CORPUS_SUFFIX, ID, TEXT};
use crate::progress_log::ProgressLog;
use crate::store::CorpusStore;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Glob matched against file names, e.g. `*_merged.csv`.
    pub pattern: String,
    pub id_field: String,
    pub text_field: String,
    pub update_progress_log: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            pattern: format!("*{}", CORPUS_SUFFIX),
            id_field: ID.to_string(),
            text_field: TEXT.to_string(),
            update_progress_log: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupeStats {
    pub name: String,
    pub size_before: usize,
    pub size_after: usize,
    /// Whether a re-baselining entry was appended to the companion log.
    pub log_updated: bool,
}

impl DedupeStats {
    pub fn removed(&self) -> usize {
        self.size_before - self.size_after
    }
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub name: String,
    pub result: Result<DedupeStats>,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub outcomes: Vec<SweepOutcome>,
}

impl SweepReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &DedupeStats> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &CorpusError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }
}

/// Deduplicate every corpus in `dir` whose file name matches `options.pattern`.
///
/// Only an invalid pattern or an unlistable `dir` fails the whole sweep;
/// per-file failures land in the report.
pub fn dedupe_all(
    store: &dyn CorpusStore,
    dir: &Path,
    options: &SweepOptions,
    now: NaiveDateTime,
) -> Result<SweepReport> {
    let matcher = build_matcher(&options.pattern)?;
    let mut report = SweepReport::default();

    for path in store.list(dir)? {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if matcher.is_match(name) => name.to_string(),
            _ => continue,
        };

        let result = dedupe_file(store, &path, &name, options, now);
        match &result {
            Ok(stats) => tracing::info!(
                file = %name,
                before = stats.size_before,
                after = stats.size_after,
                "deduplicated"
            ),
            Err(e) => tracing::warn!(file = %name, error = %e, "dedupe failed"),
        }
        report.outcomes.push(SweepOutcome { name, result });
    }

    Ok(report)
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    Ok(Glob::new(pattern)?.compile_matcher())
}

fn dedupe_file(
    store: &dyn CorpusStore,
    path: &Path,
    name: &str,
    options: &SweepOptions,
    now: NaiveDateTime,
) -> Result<DedupeStats> {
    let mut corpus = store.load(path)?.unwrap_or_default();
    if !corpus.has_column(&options.text_field) {
        return Err(CorpusError::missing_field(&options.text_field));
    }

    let size_before = corpus.len();
    if corpus.has_column(&options.id_field) {
        corpus.dedupe_by(&options.id_field);
    }
    corpus.dedupe_by(&options.text_field);
    let size_after = corpus.len();

    store.save(path, &corpus)?;

    let log_updated = options.update_progress_log && rebaseline(store, path, size_after, now)?;

    Ok(DedupeStats {
        name: name.to_string(),
        size_before,
        size_after,
        log_updated,
    })
}

/// Append `(now, size)` to the corpus's existing log when its last total differs.
fn rebaseline(
    store: &dyn CorpusStore,
    corpus: &Path,
    size: usize,
    now: NaiveDateTime,
) -> Result<bool> {
    let Some(target) = CorpusTarget::from_corpus_path(corpus) else {
        return Ok(false);
    };
    let log = ProgressLog::new(store, &target.log);
    match log.last()? {
        Some(last) if last.unique_texts != size as u64 => {
            log.append(now, size as u64)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge, Delta};
    use crate::models::{Batch, Record};
    use crate::progress_log::parse_timestamp;
    use crate::store::memory::MemoryStore;

    fn now() -> NaiveDateTime {
        parse_timestamp("2024-06-01 08:00:00").unwrap()
    }

    fn corpus(rows: &[(&str, &str)]) -> Batch {
        Batch::new(
            vec![ID.to_string(), TEXT.to_string()],
            rows.iter()
                .map(|(id, text)| Record::new().with(ID, *id).with(TEXT, *text))
                .collect(),
        )
    }

    fn dir() -> &'static Path {
        Path::new("data")
    }

    #[test]
    fn test_dedupes_by_id_then_text() {
        let store = MemoryStore::new();
        let path = dir().join("a_merged.csv");
        store
            .save(
                &path,
                &corpus(&[("1", "x"), ("1", "y"), ("2", "x"), ("3", "z")]),
            )
            .unwrap();

        let report = dedupe_all(&store, dir(), &SweepOptions::default(), now()).unwrap();
        let stats: Vec<_> = report.succeeded().collect();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].size_before, 4);
        assert_eq!(stats[0].size_after, 2);
        assert_eq!(stats[0].removed(), 2);

        let stored = store.load(&path).unwrap().unwrap();
        let texts: Vec<_> = stored.records.iter().map(|r| r.get(TEXT)).collect();
        assert_eq!(texts, vec![Some("x"), Some("z")]);
    }

    #[test]
    fn test_second_sweep_removes_nothing() {
        let store = MemoryStore::new();
        store
            .save(
                &dir().join("a_merged.csv"),
                &corpus(&[("1", "x"), ("1", "x2"), ("2", "y")]),
            )
            .unwrap();

        let first = dedupe_all(&store, dir(), &SweepOptions::default(), now()).unwrap();
        let first: Vec<_> = first.succeeded().cloned().collect();
        assert!(first[0].size_after < first[0].size_before);

        let second = dedupe_all(&store, dir(), &SweepOptions::default(), now()).unwrap();
        let second: Vec<_> = second.succeeded().cloned().collect();
        assert_eq!(second[0].size_before, second[0].size_after);
    }

    #[test]
    fn test_failure_does_not_stop_sweep() {
        let store = MemoryStore::new();
        let broken = Batch::new(vec!["Body".into()], vec![Record::new().with("Body", "b")]);
        store.save(&dir().join("a_merged.csv"), &broken).unwrap();
        store
            .save(&dir().join("b_merged.csv"), &corpus(&[("1", "x"), ("1", "x")]))
            .unwrap();
        store
            .save(&dir().join("notes.csv"), &corpus(&[("1", "x"), ("1", "x")]))
            .unwrap();

        let report = dedupe_all(&store, dir(), &SweepOptions::default(), now()).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        let failed: Vec<_> = report.failed().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["a_merged.csv"]);
        assert_eq!(report.succeeded().next().unwrap().size_after, 1);
        // files outside the pattern are untouched
        assert_eq!(store.load(&dir().join("notes.csv")).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_silent_sweep_leads_to_decrease() {
        let store = MemoryStore::new();
        let target = CorpusTarget::for_name(dir(), "t");
        merge(
            &store,
            corpus(&[("1", "x"), ("1", "y"), ("2", "z")]),
            3,
            &target,
            TEXT,
            now(),
        )
        .unwrap();

        dedupe_all(&store, dir(), &SweepOptions::default(), now()).unwrap();
        let next = merge(&store, Batch::default(), 0, &target, TEXT, now()).unwrap();
        assert_eq!(next.new_posts, Delta::Decrease(1));
    }

    #[test]
    fn test_rebaselined_sweep_keeps_delta_non_negative() {
        let store = MemoryStore::new();
        let target = CorpusTarget::for_name(dir(), "t");
        merge(
            &store,
            corpus(&[("1", "x"), ("1", "y"), ("2", "z")]),
            3,
            &target,
            TEXT,
            now(),
        )
        .unwrap();

        let options = SweepOptions {
            update_progress_log: true,
            ..SweepOptions::default()
        };
        let report = dedupe_all(&store, dir(), &options, now()).unwrap();
        assert!(report.succeeded().next().unwrap().log_updated);

        let next = merge(&store, Batch::default(), 0, &target, TEXT, now()).unwrap();
        assert_eq!(next.new_posts, Delta::Unchanged);
    }

    #[test]
    fn test_rebaseline_skipped_without_log() {
        let store = MemoryStore::new();
        store
            .save(&dir().join("a_merged.csv"), &corpus(&[("1", "x"), ("1", "x")]))
            .unwrap();
        let options = SweepOptions {
            update_progress_log: true,
            ..SweepOptions::default()
        };
        let report = dedupe_all(&store, dir(), &options, now()).unwrap();
        assert!(!report.succeeded().next().unwrap().log_updated);
        assert!(store.read_log(&dir().join("a_log.csv")).unwrap().is_empty());
    }
}
