//! Validator Module
//!
//! Structural integrity checks run after load and on demand.

use thiserror::Error;

use crate::cache::{Entry, Repository, FORMAT_VERSION};

// == Violation ==
/// First rule a repository was found to break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("format version '{found}' does not match '{expected}'")]
    StaleVersion { found: String, expected: String },

    #[error("recency list links are inconsistent")]
    MalformedRecency,

    #[error("recency tracks {recency} keys but table holds {table}")]
    LengthMismatch { recency: usize, table: usize },

    #[error("recency list contains duplicate keys")]
    DuplicateKey,

    #[error("recency key '{0}' has no table entry")]
    OrphanRecencyKey(String),

    #[error("table key '{0}' is not tracked by recency")]
    UntrackedKey(String),

    #[error("entry '{0}' does not match its declared kind")]
    InvalidEntry(String),
}

// == Entry Checks ==
/// True iff the entry has no declared kind or its value matches it.
pub fn validate_entry(entry: &Entry) -> bool {
    entry.is_valid()
}

// == Repository Checks ==
/// Checks every structural rule, reporting the first violation found.
pub fn check_repository(repo: &Repository) -> Result<(), Violation> {
    if repo.format_version() != FORMAT_VERSION {
        return Err(Violation::StaleVersion {
            found: repo.format_version().to_string(),
            expected: FORMAT_VERSION.to_string(),
        });
    }

    let table = repo.table();
    let recency = repo.recency();

    if !recency.is_well_formed() {
        return Err(Violation::MalformedRecency);
    }

    if recency.len() != table.len() {
        return Err(Violation::LengthMismatch {
            recency: recency.len(),
            table: table.len(),
        });
    }

    if recency.has_duplicates() {
        return Err(Violation::DuplicateKey);
    }

    if let Some(orphan) = recency.iter().find(|key| !table.contains_key(*key)) {
        return Err(Violation::OrphanRecencyKey(orphan.to_string()));
    }

    if let Some(untracked) = table.keys().find(|key| !recency.contains(key)) {
        return Err(Violation::UntrackedKey(untracked.clone()));
    }

    if let Some((key, _)) = table.iter().find(|(_, entry)| !validate_entry(entry)) {
        return Err(Violation::InvalidEntry(key.clone()));
    }

    Ok(())
}

/// True iff `check_repository` finds no violation.
pub fn validate_repository(repo: &Repository) -> bool {
    check_repository(repo).is_ok()
}
