//! Persistence Module
//!
//! Reads and writes repository snapshots as JSON files.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::{Entry, RecencyIndex};
use crate::error::{CacheError, Result};

/// File extension appended to repository names.
pub const FILE_EXTENSION: &str = "json";

// == Snapshot ==
/// Full persisted state of a repository. The name is not stored: it is
/// assigned by whoever loads the file.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub max_size: usize,
    pub save_delay_ms: u64,
    pub table: HashMap<String, Entry>,
    pub recency: RecencyIndex,
}

/// Borrowed view of a repository used for writing.
#[derive(Debug, Serialize)]
pub struct SnapshotRef<'a> {
    pub version: &'a str,
    pub max_size: usize,
    pub save_delay_ms: u64,
    pub table: &'a HashMap<String, Entry>,
    pub recency: &'a RecencyIndex,
}

// == Paths ==
/// Builds the persisted file path for a repository name.
///
/// Names may contain `/` to namespace repositories into subdirectories.
/// Names that are empty, absolute, end in `/` or use `.`/`..` segments are
/// rejected so the file always lands under `base_dir`.
pub fn file_path(base_dir: &Path, name: &str) -> Result<PathBuf> {
    if !is_contained_name(name) {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(base_dir.join(format!("{name}.{FILE_EXTENSION}")))
}

fn is_contained_name(name: &str) -> bool {
    !name.is_empty()
        && !name.ends_with('/')
        && !name.split('/').any(|segment| segment == "." || segment == "..")
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Creates the directory that will hold `path`.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

// == Write ==
/// Writes a snapshot to a temporary sibling then renames it over `path`,
/// so a reader never observes a partial file.
pub fn write(path: &Path, snapshot: &SnapshotRef<'_>) -> io::Result<()> {
    ensure_parent(path)?;

    let tmp = temp_path(path);
    {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
    }

    fs::rename(&tmp, path)
}

// == Read ==
/// Reads a snapshot. Any failure is reported as a generic error; callers
/// treat it as "no usable persisted state".
pub fn read(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

// == Remove ==
/// Deletes a persisted file. A missing file is not an error.
pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
