//! Periodic Flush Task
//!
//! Background task that saves repositories left dirty by throttling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Registry;

/// Spawns a background task that periodically flushes dirty repositories.
///
/// Each tick runs `Registry::flush_due`, which still honours every
/// repository's save delay; it only catches writes that no later mutation
/// would have triggered.
///
/// # Arguments
/// * `registry` - Shared registry
/// * `flush_interval_secs` - Interval in seconds between flush runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_flush_task(registry: Arc<RwLock<Registry>>, flush_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(flush_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting flush task with interval of {} seconds",
            flush_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let written = {
                let mut guard = registry.write().await;
                guard.flush_due()
            };

            if written > 0 {
                info!("Periodic flush: saved {} repositories", written);
            } else {
                debug!("Periodic flush: nothing due");
            }
        }
    })
}
