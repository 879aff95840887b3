//! CSV-file [`CorpusStore`].
//!
//! A corpus is one CSV file with a header row; empty cells load as nulls.
//! A progress log is a CSV file with a `timestamp,unique_texts` header,
//! opened in append mode for each new entry.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CorpusError, Result};
use crate::models::{Batch, Record};
use crate::progress_log::{parse_timestamp, ProgressEntry};

use super::CorpusStore;

const LOG_HEADER: [&str; 2] = ["timestamp", "unique_texts"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStore;

impl CsvStore {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_parent(location: &Path) -> Result<()> {
    if let Some(parent) = location.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
        }
    }
    Ok(())
}

impl CorpusStore for CsvStore {
    fn load(&self, location: &Path) -> Result<Option<Batch>> {
        if !location.exists() {
            return Ok(None);
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(location)
            .map_err(|e| CorpusError::csv(location, e))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| CorpusError::csv(location, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| CorpusError::csv(location, e))?;
            let mut record = Record::new();
            for (column, cell) in columns.iter().zip(row.iter()) {
                if !cell.is_empty() {
                    record.set(column, cell);
                }
            }
            records.push(record);
        }

        Ok(Some(Batch::new(columns, records)))
    }

    fn save(&self, location: &Path, batch: &Batch) -> Result<()> {
        ensure_parent(location)?;
        let mut writer = WriterBuilder::new()
            .from_path(location)
            .map_err(|e| CorpusError::csv(location, e))?;

        if !batch.columns.is_empty() {
            writer
                .write_record(&batch.columns)
                .map_err(|e| CorpusError::csv(location, e))?;
            for record in &batch.records {
                writer
                    .write_record(batch.columns.iter().map(|c| record.get(c).unwrap_or("")))
                    .map_err(|e| CorpusError::csv(location, e))?;
            }
        }

        writer.flush().map_err(|e| CorpusError::io(location, e))
    }

    fn read_log(&self, location: &Path) -> Result<Vec<ProgressEntry>> {
        if !location.exists() {
            return Ok(Vec::new());
        }

        let malformed = |row: usize, reason: String| CorpusError::MalformedLog {
            path: location.to_path_buf(),
            row,
            reason,
        };

        let mut reader = ReaderBuilder::new()
            .from_path(location)
            .map_err(|e| CorpusError::csv(location, e))?;
        let headers = reader
            .headers()
            .map_err(|e| CorpusError::csv(location, e))?
            .clone();

        // an empty file has no header yet
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| malformed(0, format!("missing column '{}'", name)))
        };
        let ts_idx = column(LOG_HEADER[0])?;
        let total_idx = column(LOG_HEADER[1])?;

        let mut entries = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row.map_err(|e| CorpusError::csv(location, e))?;
            let raw_ts = row.get(ts_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| malformed(i + 1, format!("bad timestamp '{}'", raw_ts)))?;
            let raw_total = row.get(total_idx).unwrap_or_default();
            let unique_texts = raw_total
                .trim()
                .parse::<u64>()
                .map_err(|e| malformed(i + 1, format!("bad unique_texts '{}': {}", raw_total, e)))?;
            entries.push(ProgressEntry::new(timestamp, unique_texts));
        }

        Ok(entries)
    }

    fn append_log(&self, location: &Path, entry: &ProgressEntry) -> Result<()> {
        ensure_parent(location)?;
        let needs_header = fs::metadata(location)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(location)
            .map_err(|e| CorpusError::io(location, e))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer
                .write_record(LOG_HEADER)
                .map_err(|e| CorpusError::csv(location, e))?;
        }
        writer
            .write_record([entry.formatted_timestamp(), entry.unique_texts.to_string()])
            .map_err(|e| CorpusError::csv(location, e))?;
        writer.flush().map_err(|e| CorpusError::io(location, e))
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(CorpusError::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| CorpusError::io(dir, e.into()))?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn size(&self, location: &Path) -> Result<Option<u64>> {
        match fs::metadata(location) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CorpusError::io(location, e)),
        }
    }
}
