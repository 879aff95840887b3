//! Storage abstraction for corpora and progress logs.
//!
//! The [`CorpusStore`] trait makes every location explicit: nothing in the
//! core reads or writes an implicit global path. [`CsvStore`] keeps corpora
//! as CSV files on disk; [`MemoryStore`](memory::MemoryStore) keeps them in
//! process memory.
//!
//! Implementations are synchronous. The cleaner and merger never suspend,
//! so there is nothing to gain from an async store.

pub mod csv_file;
pub mod memory;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Batch;
use crate::progress_log::ProgressEntry;

pub use csv_file::CsvStore;

/// Abstract persistence for corpora and their progress logs.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](CorpusStore::load) | Read a corpus, `None` if it does not exist |
/// | [`save`](CorpusStore::save) | Overwrite a corpus |
/// | [`read_log`](CorpusStore::read_log) | Read all progress log entries |
/// | [`append_log`](CorpusStore::append_log) | Append one progress log entry |
/// | [`list`](CorpusStore::list) | List entries directly inside a directory |
/// | [`size`](CorpusStore::size) | Stored size of a corpus, `None` if it does not exist |
pub trait CorpusStore: Send + Sync {
    fn load(&self, location: &Path) -> Result<Option<Batch>>;

    /// Replace whatever is stored at `location` with `batch`.
    fn save(&self, location: &Path, batch: &Batch) -> Result<()>;

    /// All entries in write order; empty when the log does not exist.
    fn read_log(&self, location: &Path) -> Result<Vec<ProgressEntry>>;

    fn append_log(&self, location: &Path, entry: &ProgressEntry) -> Result<()>;

    /// Locations directly inside `dir`, sorted.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Bytes held for the corpus at `location`.
    fn size(&self, location: &Path) -> Result<Option<u64>>;
}
