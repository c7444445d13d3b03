//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{RepositoryOptions, DEFAULT_MAX_SIZE, DEFAULT_SAVE_DELAY};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding persisted repositories
    pub cache_dir: PathBuf,
    /// Capacity of repositories created on first access
    pub max_size: usize,
    /// Minimum seconds between unforced saves
    pub save_delay: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background flush task interval in seconds
    pub flush_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Persistence directory (default: .cache/lru)
    /// - `MAX_SIZE` - Repository capacity (default: 200)
    /// - `SAVE_DELAY` - Save throttle in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FLUSH_INTERVAL` - Flush frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var_os("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_size: parse_var("MAX_SIZE").unwrap_or(defaults.max_size),
            save_delay: parse_var("SAVE_DELAY").unwrap_or(defaults.save_delay),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            flush_interval: parse_var("FLUSH_INTERVAL").unwrap_or(defaults.flush_interval),
        }
    }

    /// Options used when a repository is opened for the first time.
    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            max_size: self.max_size,
            save_delay: Duration::from_secs(self.save_delay),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache/lru"),
            max_size: DEFAULT_MAX_SIZE,
            save_delay: DEFAULT_SAVE_DELAY.as_secs(),
            server_port: 3000,
            flush_interval: 60,
        }
    }
}
