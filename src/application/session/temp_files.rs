//! Ownership ledger for files a session creates and must delete

use crate::domain::call::notification::CleanupReport;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// How a tracked resource is released at teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    RemoveFile,
}

/// Temporary resources owned by one session
#[derive(Debug, Default)]
pub struct TempResourceRegistry {
    entries: HashMap<PathBuf, Release>,
}

impl TempResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a file; tracking the same path twice is a no-op
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.entries.entry(path.into()).or_insert(Release::RemoveFile);
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every tracked resource once and empty the registry.
    /// Failures are logged and counted, never returned.
    pub async fn clear(&mut self) -> CleanupReport {
        let entries: Vec<(PathBuf, Release)> = self.entries.drain().collect();

        let outcomes = join_all(entries.into_iter().map(|(path, release)| async move {
            match release {
                Release::RemoveFile => remove_file(&path).await,
            }
        }))
        .await;

        let removed = outcomes.iter().filter(|ok| **ok).count();
        CleanupReport {
            attempted: outcomes.len(),
            removed,
            failed: outcomes.len() - removed,
        }
    }
}

/// Best-effort delete of one file; true on success
pub async fn remove_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Deleted tmp file");
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error deleting tmp file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_file() -> PathBuf {
        let path = std::env::temp_dir().join(format!("lexgate-test-{}.wav", Uuid::new_v4()));
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }

    #[test]
    fn test_track_is_idempotent() {
        let mut registry = TempResourceRegistry::new();
        registry.track("/tmp/a.wav");
        registry.track("/tmp/a.wav");
        registry.track(PathBuf::from("/tmp/a.wav"));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("/tmp/a.wav"));
    }

    #[tokio::test]
    async fn test_repeated_adds_cost_one_deletion() {
        let path = scratch_file();
        let mut registry = TempResourceRegistry::new();
        for _ in 0..5 {
            registry.track(&path);
        }

        let report = registry.clear().await;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.removed, 1);
        assert!(!path.exists());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_deletion_is_counted_not_raised() {
        let existing = scratch_file();
        let mut registry = TempResourceRegistry::new();
        registry.track(&existing);
        registry.track(std::env::temp_dir().join(format!("lexgate-missing-{}.wav", Uuid::new_v4())));

        let report = registry.clear().await;
        assert_eq!(
            report,
            CleanupReport {
                attempted: 2,
                removed: 1,
                failed: 1
            }
        );
        assert!(!existing.exists());
    }

    #[tokio::test]
    async fn test_clear_on_empty_registry() {
        let mut registry = TempResourceRegistry::new();
        assert_eq!(registry.clear().await, CleanupReport::default());
    }
}
