//! Core data models used throughout Corpus Harness.
//!
//! These types represent the posts, records, and batches that flow from a
//! producer through the cleaner and merger into a persisted corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const TITLE: &str = "Title";
pub const TEXT: &str = "Text";
pub const USERNAME: &str = "Username";
pub const ID: &str = "ID";
pub const COMMUNITY: &str = "community";
pub const DATE: &str = "Date";
pub const TIME: &str = "Time";
pub const POST_URL: &str = "Post URL";

/// Column order of a corpus built from [`Post`]s.
pub const POST_COLUMNS: [&str; 8] = [TITLE, TEXT, USERNAME, ID, COMMUNITY, DATE, TIME, POST_URL];

/// File name suffix of a persisted corpus.
pub const CORPUS_SUFFIX: &str = "_merged.csv";
/// File name suffix of a corpus's progress log.
pub const LOG_SUFFIX: &str = "_log.csv";

/// Raw item produced by a [`Producer`](crate::producer::Producer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub id: String,
    pub community: String,
    /// Creation time, seconds since the Unix epoch.
    pub created_utc: i64,
    #[serde(default)]
    pub url: Option<String>,
}

impl Post {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_utc, 0)
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.set(TITLE, &self.title);
        if let Some(text) = &self.text {
            record.set(TEXT, text);
        }
        if let Some(author) = &self.author {
            record.set(USERNAME, author);
        }
        record.set(ID, &self.id);
        record.set(COMMUNITY, &self.community);
        if let Some(created) = self.created_at() {
            record.set(DATE, created.format("%d-%m-%Y").to_string());
            record.set(TIME, created.format("%H:%M:%S").to_string());
        }
        if let Some(url) = &self.url {
            record.set(POST_URL, url);
        }
        record
    }
}

/// One row of a corpus: column name to cell value. A missing key is a null cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Record::set).
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }
}

/// An ordered table of records with an explicit schema.
///
/// Used both for one fetch cycle's batch and for a whole loaded corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Batch with the canonical post schema, in producer order.
    pub fn from_posts(posts: &[Post]) -> Self {
        Self {
            columns: POST_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records: posts.iter().map(Post::to_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    /// Append `other` after `self`. The schema is the union of both, with
    /// `self`'s columns first.
    pub fn concat(mut self, other: Batch) -> Batch {
        for column in other.columns {
            if !self.has_column(&column) {
                self.columns.push(column);
            }
        }
        self.records.extend(other.records);
        self
    }

    /// Drop records whose `field` equals that of an earlier record.
    /// Null cells compare equal to each other. Returns the number removed.
    pub fn dedupe_by(&mut self, field: &str) -> usize {
        let before = self.records.len();
        let mut seen: HashSet<Option<String>> = HashSet::with_capacity(before);
        self.records
            .retain(|record| seen.insert(record.get(field).map(str::to_owned)));
        before - self.records.len()
    }
}

/// Locations of one corpus and its progress log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusTarget {
    pub corpus: PathBuf,
    pub log: PathBuf,
}

impl CorpusTarget {
    /// `<dir>/<name>_merged.csv` and `<dir>/<name>_log.csv`.
    pub fn for_name(dir: &Path, name: &str) -> Self {
        Self {
            corpus: dir.join(format!("{}{}", name, CORPUS_SUFFIX)),
            log: dir.join(format!("{}{}", name, LOG_SUFFIX)),
        }
    }

    /// Recover the target from a corpus path that follows the naming convention.
    pub fn from_corpus_path(corpus: &Path) -> Option<Self> {
        let file_name = corpus.file_name()?.to_str()?;
        let name = file_name.strip_suffix(CORPUS_SUFFIX)?;
        let dir = corpus.parent().unwrap_or_else(|| Path::new(""));
        Some(Self::for_name(dir, name))
    }
}
