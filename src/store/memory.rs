//! In-memory [`CorpusStore`] implementation for testing and embedding.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Locations are plain keys;
//! [`list`](CorpusStore::list) returns the stored corpora whose parent is
//! the requested directory. [`size`](CorpusStore::size) counts the bytes of
//! column names and cell values, without any file framing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::Result;
use crate::models::Batch;
use crate::progress_log::ProgressEntry;

use super::CorpusStore;

pub struct MemoryStore {
    corpora: RwLock<HashMap<PathBuf, Batch>>,
    logs: RwLock<HashMap<PathBuf, Vec<ProgressEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            corpora: RwLock::new(HashMap::new()),
            logs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusStore for MemoryStore {
    fn load(&self, location: &Path) -> Result<Option<Batch>> {
        Ok(self.corpora.read().unwrap().get(location).cloned())
    }

    fn save(&self, location: &Path, batch: &Batch) -> Result<()> {
        self.corpora
            .write()
            .unwrap()
            .insert(location.to_path_buf(), batch.clone());
        Ok(())
    }

    fn read_log(&self, location: &Path) -> Result<Vec<ProgressEntry>> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .get(location)
            .cloned()
            .unwrap_or_default())
    }

    fn append_log(&self, location: &Path, entry: &ProgressEntry) -> Result<()> {
        self.logs
            .write()
            .unwrap()
            .entry(location.to_path_buf())
            .or_default()
            .push(*entry);
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = self
            .corpora
            .read()
            .unwrap()
            .keys()
            .chain(self.logs.read().unwrap().keys())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn size(&self, location: &Path) -> Result<Option<u64>> {
        let corpora = self.corpora.read().unwrap();
        Ok(corpora.get(location).map(|batch| {
            let header: usize = batch.columns.iter().map(String::len).sum();
            let cells: usize = batch
                .records
                .iter()
                .flat_map(|r| batch.columns.iter().filter_map(|c| r.get(c)))
                .map(str::len)
                .sum();
            (header + cells) as u64
        }))
    }
}
