//! Append-only shadow table files
//!
//! Each shadow table is a line-delimited JSON file (JSONL) where every line is
//! one complete row. Rows are only ever appended; the file is created and
//! dropped explicitly alongside the tracked type.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{ShadowError, ShadowResult};

/// One shadow table on disk, holding rows of type `R`
pub struct ShadowTableFile<R> {
    name: String,
    path: PathBuf,
    _row: PhantomData<R>,
}

impl<R> ShadowTableFile<R>
where
    R: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            _row: PhantomData,
        }
    }

    /// Create the table, replacing any existing rows
    pub fn create(&self) -> ShadowResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(&self.path).map_err(|e| {
            ShadowError::Io(format!("Failed to create table {}: {}", self.name, e))
        })?;
        debug!(table = %self.name, "created shadow table");
        Ok(())
    }

    /// Drop the table and its rows
    pub fn drop_table(&self) -> ShadowResult<()> {
        if !self.exists() {
            return Err(ShadowError::Storage(format!(
                "table {} does not exist",
                self.name
            )));
        }
        fs::remove_file(&self.path)
            .map_err(|e| ShadowError::Io(format!("Failed to drop table {}: {}", self.name, e)))?;
        debug!(table = %self.name, "dropped shadow table");
        Ok(())
    }

    /// Append one row, flushed immediately
    pub fn append(&self, row: &R) -> ShadowResult<()> {
        if !self.exists() {
            return Err(ShadowError::Storage(format!(
                "table {} does not exist",
                self.name
            )));
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| ShadowError::Io(format!("Failed to open table {}: {}", self.name, e)))?;

        let json = serde_json::to_string(row)
            .map_err(|e| ShadowError::Json(format!("Failed to serialize row: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| ShadowError::Io(format!("Failed to write row to {}: {}", self.name, e)))?;

        file.flush()
            .map_err(|e| ShadowError::Io(format!("Failed to flush table {}: {}", self.name, e)))?;

        Ok(())
    }

    /// Read all rows, oldest first
    pub fn read_all(&self) -> ShadowResult<Vec<R>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| ShadowError::Io(format!("Failed to open table {}: {}", self.name, e)))?;

        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                ShadowError::Io(format!(
                    "Failed to read {} line {}: {}",
                    self.name,
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let row: R = serde_json::from_str(&line).map_err(|e| {
                ShadowError::Json(format!(
                    "Failed to parse {} row at line {}: {}",
                    self.name,
                    line_num + 1,
                    e
                ))
            })?;

            rows.push(row);
        }

        Ok(rows)
    }

    /// Read the most recent `count` rows
    pub fn read_recent(&self, count: usize) -> ShadowResult<Vec<R>> {
        let mut rows = self.read_all()?;
        let start = rows.len().saturating_sub(count);
        Ok(rows.split_off(start))
    }

    /// Number of non-empty rows in the table
    pub fn row_count(&self) -> ShadowResult<usize> {
        if !self.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)
            .map_err(|e| ShadowError::Io(format!("Failed to open table {}: {}", self.name, e)))?;

        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .filter_map(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .count();

        Ok(count)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
