//! Repository Module
//!
//! A named, bounded LRU cache combining a HashMap table with a recency
//! index, persisted to disk with throttled saves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::persist::{self, Snapshot, SnapshotRef};
use crate::cache::{validator, CacheStats, Entry, RecencyIndex};
use crate::error::{CacheError, Result};

/// Format version stamped on every save and required on load.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default capacity bound.
pub const DEFAULT_MAX_SIZE: usize = 200;

/// Default minimum interval between unforced saves.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(300);

// == Repository Options ==
/// Construction options for a fresh repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Maximum number of entries before eviction
    pub max_size: usize,
    /// Minimum time between unforced saves
    pub save_delay: Duration,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            save_delay: DEFAULT_SAVE_DELAY,
        }
    }
}

// == Repository ==
/// Named LRU cache persisted to a single file.
///
/// Every mutating method updates `table` and `recency` together; nothing
/// outside this type can touch one without the other.
#[derive(Debug)]
pub struct Repository {
    name: String,
    path: PathBuf,
    format_version: String,
    /// Authoritative key-entry storage
    table: HashMap<String, Entry>,
    /// Keys ordered most recent first
    recency: RecencyIndex,
    max_size: usize,
    save_delay: Duration,
    /// None until the first successful save decision
    last_saved_at: Option<DateTime<Utc>>,
    /// Mutated since the last write
    dirty: bool,
    stats: CacheStats,
}

impl Repository {
    // == Constructors ==
    /// Creates an empty repository persisted at `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, options: RepositoryOptions) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format_version: FORMAT_VERSION.to_string(),
            table: HashMap::new(),
            recency: RecencyIndex::new(),
            max_size: options.max_size,
            save_delay: options.save_delay,
            last_saved_at: None,
            dirty: false,
            stats: CacheStats::new(),
        }
    }

    /// Rebuilds a repository from persisted state. No validation is done
    /// here; see `validator::check_repository`.
    pub fn from_snapshot(name: impl Into<String>, path: impl Into<PathBuf>, snapshot: Snapshot) -> Self {
        let mut stats = CacheStats::new();
        stats.set_total_entries(snapshot.table.len());

        Self {
            name: name.into(),
            path: path.into(),
            format_version: snapshot.version,
            table: snapshot.table,
            recency: snapshot.recency,
            max_size: snapshot.max_size,
            save_delay: Duration::from_millis(snapshot.save_delay_ms),
            last_saved_at: None,
            dirty: false,
            stats,
        }
    }

    /// Reads the file at `path` into an unvalidated repository.
    pub fn load(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = persist::read(&path)?;
        Ok(Self::from_snapshot(name, path, snapshot))
    }

    // == Get ==
    /// Returns the stored value if present and individually valid.
    ///
    /// Reads never refresh recency; only `put` does.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Returns the stored entry if present and individually valid.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.table.get(key).filter(|entry| entry.is_valid())
    }

    /// Returns the value for `key` decoded as `T`, or `default` when the key
    /// is absent, invalid, or does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.value(key)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or(default)
    }

    /// True iff `key` maps to a present, individually valid entry.
    pub fn has(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    // == Put ==
    /// Stores a serializable value, recording its runtime kind.
    pub fn put<V: Serialize>(&mut self, key: impl Into<String>, value: V) -> Result<&Entry> {
        let entry = Entry::from_serialize(value)?;
        Ok(self.put_entry(key, entry))
    }

    /// Stores an entry as-is and makes `key` the most recently used.
    ///
    /// When the repository is full the least recently used key is evicted
    /// first, even if `key` is already present and would simply be
    /// overwritten. That key may be `key` itself.
    pub fn put_entry(&mut self, key: impl Into<String>, entry: Entry) -> &Entry {
        let key = key.into();

        if self.table.len() >= self.max_size {
            self.evict_oldest();
        }

        self.table.insert(key.clone(), entry);
        self.recency.touch(&key);
        self.mark_dirty();

        &self.table[&key]
    }

    fn evict_oldest(&mut self) {
        if let Some(evicted) = self.recency.evict_oldest() {
            self.table.remove(&evicted);
            self.stats.record_eviction();
            debug!(repository = %self.name, key = %evicted, "Evicted least recently used entry");
            self.mark_dirty();
        }
    }

    // == Invalidate ==
    /// Removes `key` from the repository. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.table.remove(key).is_some();
        let untracked = self.recency.remove(key);
        if removed || untracked {
            self.mark_dirty();
        } else {
            self.save_throttled();
        }
        removed
    }

    // == Clear ==
    /// Drops every entry, keeping the table's allocation.
    pub fn clear(&mut self) {
        self.table.clear();
        self.recency.clear();
        self.mark_dirty();
    }

    // == Purge Invalid ==
    /// Removes every entry whose value no longer matches its declared kind,
    /// from both the table and the recency index.
    ///
    /// Returns the number of entries removed.
    pub fn purge_invalid(&mut self) -> usize {
        let invalid: Vec<String> = self
            .table
            .iter()
            .filter(|(_, entry)| !validator::validate_entry(entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &invalid {
            self.table.remove(key);
            self.recency.remove(key);
        }

        if !invalid.is_empty() {
            warn!(repository = %self.name, count = invalid.len(), "Purged invalid entries");
            self.stats.record_purged(invalid.len());
            self.mark_dirty();
        } else {
            self.save_throttled();
        }
        invalid.len()
    }

    // == Recency Views ==
    /// Keys ordered from most to least recently put.
    pub fn most_to_least_recent(&self) -> Vec<String> {
        self.recency.most_to_least_recent()
    }

    /// Keys ordered from least to most recently put.
    pub fn least_to_most_recent(&self) -> Vec<String> {
        self.recency.least_to_most_recent()
    }

    // == Validate ==
    /// Runs the structural self-check.
    pub fn validate(&self) -> bool {
        validator::validate_repository(self)
    }

    // == Save ==
    /// Persists the repository.
    ///
    /// Unless `force` is set, the call does nothing until more than
    /// `save_delay` has elapsed since the previous save. Returns whether a
    /// write happened.
    pub fn save(&mut self, force: bool) -> Result<bool> {
        let now = Utc::now();
        if !force && !self.save_due(now) {
            self.stats.record_skipped_save();
            return Ok(false);
        }

        self.last_saved_at = Some(now);
        self.format_version = FORMAT_VERSION.to_string();

        persist::write(&self.path, &self.snapshot()).map_err(|source| CacheError::SaveFailed {
            name: self.name.clone(),
            source,
        })?;

        self.dirty = false;
        self.stats.record_save();
        debug!(repository = %self.name, path = %self.path.display(), force, "Saved repository");
        Ok(true)
    }

    /// Throttled save that only runs when there are unsaved mutations.
    pub fn flush_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.save(false)
    }

    fn save_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_saved_at {
            None => true,
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed > self.save_delay)
                .unwrap_or(false),
        }
    }

    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            version: &self.format_version,
            max_size: self.max_size,
            save_delay_ms: self.save_delay.as_millis() as u64,
            table: &self.table,
            recency: &self.recency,
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.stats.set_total_entries(self.table.len());
        self.save_throttled();
    }

    // Mutations never fail on a throttled write; the repository stays dirty.
    fn save_throttled(&mut self) {
        if let Err(e) = self.save(false) {
            warn!(repository = %self.name, error = %e, "Deferred save failed");
        }
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn save_delay(&self) -> Duration {
        self.save_delay
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns current counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.table.len());
        stats
    }

    pub(crate) fn table(&self) -> &HashMap<String, Entry> {
        &self.table
    }

    pub(crate) fn recency(&self) -> &RecencyIndex {
        &self.recency
    }
}
