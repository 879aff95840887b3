//! Pluggable post producers.
//!
//! The collection pipeline only needs "a finite list of [`Post`]s for a
//! [`Query`]". How a producer gets them (HTTP API, export files, fixtures)
//! and how it paces itself are its own business; the cleaner and merger run
//! after the fetch has finished.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use anyhow::Result;
//! use corpus_harness::models::Post;
//! use corpus_harness::producer::{Producer, Query};
//!
//! pub struct FixedProducer(Vec<Post>);
//!
//! #[async_trait]
//! impl Producer for FixedProducer {
//!     fn name(&self) -> &str { "fixed" }
//!
//!     async fn fetch(&self, query: &Query) -> Result<Vec<Post>> {
//!         Ok(self.0.iter().take(query.limit()).cloned().collect())
//!     }
//! }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::Post;

/// Community name that stands for every community a producer knows.
pub const ALL_COMMUNITIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Posts in `community` matching `keyword`.
    Search {
        community: String,
        keyword: String,
        limit: usize,
    },
    /// Latest posts in `community`, newest first.
    Newest { community: String, limit: usize },
}

impl Query {
    pub fn community(&self) -> &str {
        match self {
            Query::Search { community, .. } | Query::Newest { community, .. } => community,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Query::Search { limit, .. } | Query::Newest { limit, .. } => *limit,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Search {
                community, keyword, ..
            } => write!(f, "'{}' in {}", keyword, community),
            Query::Newest { community, .. } => write!(f, "newest in {}", community),
        }
    }
}

/// A source of posts.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Return at most `query.limit()` posts. May be slow; may fail.
    async fn fetch(&self, query: &Query) -> Result<Vec<Post>>;
}

/// Reads exported posts from `<root>/<community>.jsonl`, one JSON post per line.
///
/// The `all` community reads every `*.jsonl` file under `root`. A missing
/// export file yields no posts.
pub struct FileProducer {
    root: PathBuf,
}

impl FileProducer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn export_files(&self, community: &str) -> Result<Vec<PathBuf>> {
        if community != ALL_COMMUNITIES {
            let path = self.root.join(format!("{}.jsonl", community));
            return Ok(if path.is_file() { vec![path] } else { Vec::new() });
        }

        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "jsonl") {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn read_posts(path: &Path) -> Result<Vec<Post>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read export file: {}", path.display()))?;

    let mut posts = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let post: Post = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid post", path.display(), i + 1))?;
        posts.push(post);
    }
    Ok(posts)
}

fn matches_keyword(post: &Post, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    post.title.to_lowercase().contains(&needle)
        || post
            .text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
}

#[async_trait]
impl Producer for FileProducer {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for path in self.export_files(query.community())? {
            posts.extend(read_posts(&path).await?);
        }

        match query {
            Query::Search { keyword, .. } => posts.retain(|p| matches_keyword(p, keyword)),
            Query::Newest { .. } => posts.sort_by(|a, b| b.created_utc.cmp(&a.created_utc)),
        }
        posts.truncate(query.limit());
        Ok(posts)
    }
}
