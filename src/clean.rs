//! Batch cleaning: drop blank texts, then drop duplicate texts.
//!
//! Pure transformation over an in-memory [`Batch`]; the surviving records
//! keep their relative order.

use serde::Serialize;

use crate::error::{CorpusError, Result};
use crate::models::Batch;

/// Output of [`clean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub batch: Batch,
    pub removed_blank: usize,
    pub removed_duplicate: usize,
}

impl Cleaned {
    pub fn stats(&self) -> CleanStats {
        CleanStats {
            kept: self.batch.len(),
            removed_blank: self.removed_blank,
            removed_duplicate: self.removed_duplicate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub kept: usize,
    pub removed_blank: usize,
    pub removed_duplicate: usize,
}

/// Remove records whose `text_field` is null or whitespace-only, then
/// remove records repeating an earlier record's `text_field` exactly.
///
/// Fails with [`CorpusError::MissingField`] if `text_field` is not a
/// column of `batch`.
pub fn clean(mut batch: Batch, text_field: &str) -> Result<Cleaned> {
    if !batch.has_column(text_field) {
        return Err(CorpusError::missing_field(text_field));
    }

    let before = batch.len();
    batch
        .records
        .retain(|record| matches!(record.get(text_field), Some(text) if !text.trim().is_empty()));
    let removed_blank = before - batch.len();

    let removed_duplicate = batch.dedupe_by(text_field);

    Ok(Cleaned {
        batch,
        removed_blank,
        removed_duplicate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, ID, TEXT};

    fn batch(texts: &[Option<&str>]) -> Batch {
        Batch::new(
            vec![TEXT.to_string(), ID.to_string()],
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let r = Record::new().with(ID, i.to_string());
                    match t {
                        Some(t) => r.with(TEXT, *t),
                        None => r,
                    }
                })
                .collect(),
        )
    }

    fn texts(batch: &Batch) -> Vec<&str> {
        batch
            .records
            .iter()
            .map(|r| r.get(TEXT).unwrap_or("<null>"))
            .collect()
    }

    #[test]
    fn test_blank_and_duplicate_scenario() {
        let input = batch(&[Some("hello"), Some("hello"), Some(" "), Some("world")]);
        let cleaned = clean(input, TEXT).unwrap();
        assert_eq!(cleaned.removed_blank, 1);
        assert_eq!(cleaned.removed_duplicate, 1);
        assert_eq!(texts(&cleaned.batch), vec!["hello", "world"]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let input = batch(&[Some("a"), Some("b"), Some("a")]);
        let cleaned = clean(input, TEXT).unwrap();
        assert_eq!(cleaned.batch.records[0].get(ID), Some("0"));
        assert_eq!(cleaned.batch.records[1].get(ID), Some("1"));
    }

    #[test]
    fn test_nulls_and_whitespace_removed() {
        let input = batch(&[None, Some(""), Some("\t\n"), Some(" padded ")]);
        let cleaned = clean(input, TEXT).unwrap();
        assert_eq!(cleaned.removed_blank, 3);
        assert_eq!(cleaned.removed_duplicate, 0);
        // surviving text is not trimmed
        assert_eq!(texts(&cleaned.batch), vec![" padded "]);
    }

    #[test]
    fn test_near_duplicates_are_distinct() {
        let input = batch(&[Some("Hello"), Some("hello"), Some("hello ")]);
        let cleaned = clean(input, TEXT).unwrap();
        assert_eq!(cleaned.batch.len(), 3);
    }

    #[test]
    fn test_missing_field() {
        let input = batch(&[Some("x")]);
        let err = clean(input, "Body").unwrap_err();
        assert!(matches!(err, CorpusError::MissingField { ref field } if field == "Body"));
    }

    #[test]
    fn test_empty_batch_with_schema() {
        let cleaned = clean(batch(&[]), TEXT).unwrap();
        assert!(cleaned.batch.is_empty());
        assert_eq!(cleaned.stats(), CleanStats::default());
    }

    #[test]
    fn test_idempotent() {
        let input = batch(&[
            Some("a"),
            None,
            Some("b"),
            Some("a"),
            Some("  "),
            Some("c"),
            Some("b"),
        ]);
        let once = clean(input, TEXT).unwrap();
        let twice = clean(once.batch.clone(), TEXT).unwrap();
        assert_eq!(twice.removed_blank, 0);
        assert_eq!(twice.removed_duplicate, 0);
        assert_eq!(twice.batch, once.batch);
    }
}
