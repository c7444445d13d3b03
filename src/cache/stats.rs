//! Cache Statistics Module
//!
//! Tracks eviction and persistence counters for a repository.

use serde::Serialize;

// == Cache Stats ==
/// Per-repository counters. Not persisted: they restart at zero on load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of entries evicted due to the size bound
    pub evictions: u64,
    /// Number of snapshots written to disk
    pub saves: u64,
    /// Number of save requests skipped by throttling
    pub skipped_saves: u64,
    /// Number of entries removed by `purge_invalid`
    pub purged: u64,
    /// Current number of entries in the repository
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Write Ratio ==
    /// Fraction of save requests that reached the disk.
    ///
    /// Returns 0.0 if no save was requested.
    pub fn write_ratio(&self) -> f64 {
        let total = self.saves + self.skipped_saves;
        if total == 0 {
            0.0
        } else {
            self.saves as f64 / total as f64
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_save(&mut self) {
        self.saves += 1;
    }

    pub fn record_skipped_save(&mut self) {
        self.skipped_saves += 1;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
