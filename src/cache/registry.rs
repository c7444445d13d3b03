//! Registry Module
//!
//! Maps repository names to live instances, loading persisted state on
//! first access.

use std::collections::hash_map::{self, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cache::persist;
use crate::cache::validator;
use crate::cache::{Repository, RepositoryOptions, FORMAT_VERSION};
use crate::error::Result;

// == Registry ==
/// Owns at most one live repository per name.
///
/// `open` holds `&mut self` for the whole load-or-create, so a nested open
/// of the name being loaded cannot happen.
#[derive(Debug)]
pub struct Registry {
    /// Directory holding persisted repositories
    base_dir: PathBuf,
    repositories: HashMap<String, Repository>,
}

impl Registry {
    // == Constructor ==
    /// Creates an empty registry persisting under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            repositories: HashMap::new(),
        }
    }

    // == Open ==
    /// Returns the repository called `name`, loading it from disk or
    /// creating it from `options` on first access.
    ///
    /// Persisted state that cannot be read, decoded or validated is ignored
    /// and a fresh repository is built instead. A registered instance with a
    /// stale format version is dropped and rebuilt the same way.
    ///
    /// Fails only for names that would resolve outside the base directory.
    pub fn open(&mut self, name: &str, options: RepositoryOptions) -> Result<&mut Repository> {
        let path = self.path_for(name)?;
        self.drop_stale(name);

        Ok(match self.repositories.entry(name.to_string()) {
            hash_map::Entry::Occupied(slot) => slot.into_mut(),
            hash_map::Entry::Vacant(slot) => {
                let repo = load_candidate(name, &path).unwrap_or_else(|| create(name, path, options));
                slot.insert(repo)
            }
        })
    }

    /// Like `open`, but returns `None` instead of creating a repository that
    /// is neither registered nor persisted.
    pub fn open_existing(
        &mut self,
        name: &str,
        options: RepositoryOptions,
    ) -> Result<Option<&mut Repository>> {
        let path = self.path_for(name)?;
        if !self.repositories.contains_key(name) && !path.exists() {
            return Ok(None);
        }
        self.open(name, options).map(Some)
    }

    fn drop_stale(&mut self, name: &str) {
        let stale = self
            .repositories
            .get(name)
            .is_some_and(|repo| repo.format_version() != FORMAT_VERSION);
        if stale {
            self.repositories.remove(name);
            info!(repository = %name, "Dropped registered repository with stale format version");
        }
    }

    // == Lookup ==
    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Repository> {
        self.repositories.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.repositories.contains_key(name)
    }

    /// Names of all live repositories, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.repositories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persisted file path for `name`, or `InvalidName` if it would escape
    /// the base directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        persist::file_path(&self.base_dir, name)
    }

    // == Destroy ==
    /// Forgets the repository and deletes its persisted file.
    ///
    /// Destroying an unknown or already destroyed name is not an error.
    pub fn destroy(&mut self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        self.repositories.remove(name);
        persist::remove(&path)?;
        info!(repository = %name, "Destroyed repository");
        Ok(())
    }

    // == Flush ==
    /// Runs a throttled save on every repository with unsaved changes.
    ///
    /// Returns the number of repositories written.
    pub fn flush_due(&mut self) -> usize {
        let mut written = 0;
        for repo in self.repositories.values_mut() {
            match repo.flush_if_dirty() {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => warn!(repository = %repo.name(), error = %e, "Periodic flush failed"),
            }
        }
        written
    }

    // == Shutdown ==
    /// Purges invalid entries from every repository and force-saves it.
    ///
    /// Failures are logged per repository so one broken instance cannot
    /// stop the others from flushing. Returns the number written.
    pub fn shutdown(&mut self) -> usize {
        let mut written = 0;
        for repo in self.repositories.values_mut() {
            repo.purge_invalid();
            match repo.save(true) {
                Ok(_) => written += 1,
                Err(e) => warn!(repository = %repo.name(), error = %e, "Shutdown save failed"),
            }
        }
        info!(written, total = self.repositories.len(), "Flushed repositories");
        written
    }
}

// == Load Or Create ==
fn load_candidate(name: &str, path: &Path) -> Option<Repository> {
    if !path.exists() {
        return None;
    }

    let candidate = match Repository::load(name, path) {
        Ok(repo) => repo,
        Err(e) => {
            warn!(repository = %name, error = %e, "Ignoring unreadable persisted repository");
            return None;
        }
    };

    match validator::check_repository(&candidate) {
        Ok(()) => {
            debug!(repository = %name, entries = candidate.len(), "Loaded persisted repository");
            Some(candidate)
        }
        Err(violation) => {
            warn!(repository = %name, %violation, "Discarding invalid persisted repository");
            None
        }
    }
}

fn create(name: &str, path: PathBuf, options: RepositoryOptions) -> Repository {
    if let Err(e) = persist::ensure_parent(&path) {
        warn!(repository = %name, error = %e, "Could not create repository directory");
    }
    debug!(repository = %name, max_size = options.max_size, "Created repository");
    Repository::new(name, path, options)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::persist::Snapshot;
    use crate::cache::{Entry, RecencyIndex};
    use crate::error::CacheError;
    use std::fs;
    use std::time::Duration;

    fn small() -> RepositoryOptions {
        RepositoryOptions {
            max_size: 3,
            save_delay: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        registry.open("users", small()).unwrap().put("a", 1).unwrap();
        let again = registry.open("users", RepositoryOptions::default()).unwrap();

        assert_eq!(again.get("a", 0), 1);
        assert_eq!(again.max_size(), 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_open_creates_namespaced_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        let repo = registry.open("team/users", small()).unwrap();
        assert_eq!(repo.path(), dir.path().join("team/users.json"));
        assert!(dir.path().join("team").is_dir());
    }

    #[test]
    fn test_open_loads_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut registry = Registry::new(dir.path());
            let repo = registry.open("users", small()).unwrap();
            repo.put("a", 1).unwrap();
            repo.put("b", 2).unwrap();
            repo.save(true).unwrap();
        }

        let mut registry = Registry::new(dir.path());
        let repo = registry.open("users", RepositoryOptions::default()).unwrap();
        assert_eq!(repo.get("b", 0), 2);
        assert_eq!(repo.most_to_least_recent(), vec!["b", "a"]);
        assert_eq!(repo.max_size(), 3);
    }

    #[test]
    fn test_open_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), b"\x00\x01 garbage").unwrap();

        let mut registry = Registry::new(dir.path());
        let repo = registry.open("broken", small()).unwrap();

        assert!(repo.is_empty());
        assert_eq!(repo.format_version(), FORMAT_VERSION);
    }

    #[test]
    fn test_open_ignores_inconsistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"{{"version":"{FORMAT_VERSION}","max_size":5,"save_delay_ms":0,
                "table":{{"a":{{"value":1,"declared_kind":"integer"}}}},"recency":["a","ghost"]}}"#
        );
        fs::write(dir.path().join("skewed.json"), body).unwrap();

        let mut registry = Registry::new(dir.path());
        let repo = registry.open("skewed", small()).unwrap();

        assert!(repo.is_empty());
        assert_eq!(repo.max_size(), 3);
    }

    #[test]
    fn test_destroy_then_reopen_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        let repo = registry.open("users", small()).unwrap();
        repo.put("a", 1).unwrap();
        let path = repo.path().to_path_buf();
        assert!(path.exists());

        registry.destroy("users").unwrap();
        assert!(!registry.contains("users"));
        assert!(!path.exists());
        registry.destroy("users").unwrap();

        assert!(registry.open("users", small()).unwrap().is_empty());
    }

    #[test]
    fn test_flush_due_writes_dirty_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());
        let zero = RepositoryOptions {
            max_size: 3,
            save_delay: Duration::ZERO,
        };

        registry.open("clean", zero).unwrap();
        registry.open("dirty", small()).unwrap().put("a", 1).unwrap();
        registry.open("dirty", small()).unwrap().put("b", 2).unwrap();

        // "dirty" is throttled by its 300s delay, "clean" has nothing to write
        assert_eq!(registry.flush_due(), 0);
        assert!(registry.get("dirty").unwrap().is_dirty());
    }

    #[test]
    fn test_shutdown_purges_and_forces_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        let repo = registry.open("users", small()).unwrap();
        repo.put("a", 1).unwrap();
        repo.put("b", 2).unwrap();
        registry.open("other", small()).unwrap();

        assert_eq!(registry.shutdown(), 2);

        let snapshot = persist::read(&dir.path().join("users.json")).unwrap();
        assert_eq!(snapshot.table.len(), 2);
        assert!(dir.path().join("other.json").exists());
    }

    #[test]
    fn test_shutdown_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blocked"), b"not a directory").unwrap();
        let mut registry = Registry::new(dir.path());

        registry.open("blocked/repo", small()).unwrap().put("a", 1).unwrap();
        registry.open("fine", small()).unwrap().put("a", 1).unwrap();

        assert_eq!(registry.shutdown(), 1);
        assert!(dir.path().join("fine.json").exists());
    }

    #[test]
    fn test_names_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        registry.open("b", small()).unwrap();
        registry.open("a", small()).unwrap();

        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_open_rebuilds_stale_registered_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        let path = registry.path_for("old").unwrap();
        let stale = Repository::from_snapshot(
            "old",
            path,
            Snapshot {
                version: "0.0.0-stale".to_string(),
                max_size: 10,
                save_delay_ms: 0,
                table: [("a".to_string(), Entry::new(serde_json::json!(1)))].into(),
                recency: RecencyIndex::from_keys(vec!["a".to_string()]),
            },
        );
        registry.repositories.insert("old".to_string(), stale);

        let repo = registry.open("old", small()).unwrap();
        assert!(repo.is_empty());
        assert_eq!(repo.format_version(), FORMAT_VERSION);
        assert_eq!(repo.max_size(), 3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_open_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path().join("base"));

        for name in ["../outside", "/tmp/outside", "team/../../outside"] {
            assert!(matches!(
                registry.open(name, small()),
                Err(CacheError::InvalidName(_))
            ));
            assert!(matches!(registry.destroy(name), Err(CacheError::InvalidName(_))));
        }
        assert!(registry.is_empty());
        assert!(!dir.path().join("outside.json").exists());
        assert!(!dir.path().join("base").exists());
    }

    #[test]
    fn test_open_existing_skips_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::new(dir.path());

        assert!(registry.open_existing("ghost", small()).unwrap().is_none());
        assert!(registry.is_empty());
        assert!(!dir.path().join("ghost.json").exists());

        registry.open("live", small()).unwrap();
        assert!(registry.open_existing("live", small()).unwrap().is_some());

        let fixture = registry.open("fixture", small()).unwrap();
        fixture.put("a", 1).unwrap();
        fixture.save(true).unwrap();
        fs::copy(dir.path().join("fixture.json"), dir.path().join("copied.json")).unwrap();

        let loaded = registry.open_existing("copied", small()).unwrap().unwrap();
        assert_eq!(loaded.get("a", 0), 1);
    }
}
