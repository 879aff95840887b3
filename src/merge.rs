//! Merge a cleaned batch into a persisted corpus.
//!
//! The merge concatenates the stored corpus with the batch (stored records
//! first), runs the authoritative dedupe on the text field, overwrites the
//! corpus, and appends the new unique count to the progress log. Growth is
//! measured against the last logged count, not against the pre-merge corpus
//! size, so an out-of-band shrink shows up as [`Delta::Decrease`].

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;

use crate::error::{CorpusError, Result};
use crate::models::{Batch, CorpusTarget};
use crate::progress_log::ProgressLog;
use crate::store::CorpusStore;

/// Change in unique count between the last logged snapshot and now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Delta {
    Increase(u64),
    Decrease(u64),
    Unchanged,
}

impl Delta {
    pub fn between(current: u64, baseline: u64) -> Self {
        match current.cmp(&baseline) {
            Ordering::Greater => Delta::Increase(current - baseline),
            Ordering::Less => Delta::Decrease(baseline - current),
            Ordering::Equal => Delta::Unchanged,
        }
    }

    pub fn from_signed(n: i64) -> Self {
        match n.cmp(&0) {
            Ordering::Greater => Delta::Increase(n.unsigned_abs()),
            Ordering::Less => Delta::Decrease(n.unsigned_abs()),
            Ordering::Equal => Delta::Unchanged,
        }
    }

    pub fn signed(self) -> i64 {
        match self {
            Delta::Increase(n) => n as i64,
            Delta::Decrease(n) => -(n as i64),
            Delta::Unchanged => 0,
        }
    }
}

impl Sum for Delta {
    fn sum<I: Iterator<Item = Delta>>(iter: I) -> Self {
        Delta::from_signed(iter.map(Delta::signed).sum())
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Increase(n) => write!(f, "+{}", n),
            Delta::Decrease(n) => write!(f, "-{}", n),
            Delta::Unchanged => write!(f, "0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Records the producer yielded before cleaning, as passed by the caller.
    pub raw_total: usize,
    pub pre_merge_corpus_size: usize,
    pub final_unique_count: usize,
    pub last_logged_total: u64,
    pub new_posts: Delta,
}

/// Merge `batch` into the corpus at `target.corpus` and log the result at
/// `target.log`.
///
/// The log is read before anything is written, so a malformed log leaves
/// the corpus untouched.
pub fn merge(
    store: &dyn CorpusStore,
    batch: Batch,
    raw_total: usize,
    target: &CorpusTarget,
    text_field: &str,
    now: NaiveDateTime,
) -> Result<MergeResult> {
    let existing = store.load(&target.corpus)?.unwrap_or_default();
    let pre_merge_corpus_size = existing.len();

    let mut combined = existing.concat(batch);
    if !combined.is_empty() && !combined.has_column(text_field) {
        return Err(CorpusError::missing_field(text_field));
    }
    combined.dedupe_by(text_field);
    let final_unique_count = combined.len();

    let log = ProgressLog::new(store, &target.log);
    let last_logged_total = log.last_total()?;
    let new_posts = Delta::between(final_unique_count as u64, last_logged_total);

    store.save(&target.corpus, &combined)?;
    log.append(now, final_unique_count as u64)?;

    tracing::debug!(
        corpus = %target.corpus.display(),
        pre_merge_corpus_size,
        final_unique_count,
        last_logged_total,
        new_posts = %new_posts,
        "merged batch"
    );

    Ok(MergeResult {
        raw_total,
        pre_merge_corpus_size,
        final_unique_count,
        last_logged_total,
        new_posts,
    })
}
