//! JSON document persistence for the record store
//!
//! `records.json` is replaced whole on every save. The new document goes to
//! a sibling `.json.tmp` file first and is renamed over the old one once it
//! is on disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{ShadowError, ShadowResult};

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> ShadowError {
    ShadowError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Load a document, or `T::default()` when the store has never been saved
pub fn read_json<T, P>(path: P) -> ShadowResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(storage_error("open", path, err)),
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("parse", path, e))
}

/// Replace a document in one step
pub fn write_json_atomic<T, P>(path: P, data: &T) -> ShadowResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error("create directory", parent, e))?;
    }

    let staged = staging_path(path);
    write_staged(&staged, data)?;

    if let Err(err) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(storage_error("replace", path, err));
    }

    debug!(path = %path.display(), "wrote json document");
    Ok(())
}

fn write_staged<T: Serialize>(staged: &Path, data: &T) -> ShadowResult<()> {
    let file = File::create(staged).map_err(|e| storage_error("create", staged, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| storage_error("serialize into", staged, e))?;
    writer
        .flush()
        .map_err(|e| storage_error("flush", staged, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| storage_error("sync", staged, e))
}
