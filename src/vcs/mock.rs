use super::ChangeOracle;
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scriptable [`ChangeOracle`] that records how often it was consulted
pub struct MockChangeOracle {
    changed: Mutex<HashSet<PathBuf>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockChangeOracle {
    pub fn new() -> Self {
        Self {
            changed: Mutex::new(HashSet::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reports `subtree` as changed from now on
    pub fn mark_changed(&self, subtree: impl AsRef<Path>) {
        self.changed
            .lock()
            .unwrap()
            .insert(super::relative_subtree(subtree.as_ref()));
    }

    /// Makes every subsequent query fail with a repository error
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockChangeOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeOracle for MockChangeOracle {
    async fn has_changed(&self, _repo: &Path, subtree: &Path) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(BuildError::repository(message));
        }

        let subtree = super::relative_subtree(subtree);
        Ok(self.changed.lock().unwrap().contains(&subtree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reports_marked_subtrees() {
        let oracle = MockChangeOracle::new();
        oracle.mark_changed("protos/users");

        let repo = Path::new("/repo");
        assert!(oracle
            .has_changed(repo, Path::new("/protos/users"))
            .await
            .unwrap());
        assert!(!oracle
            .has_changed(repo, Path::new("protos/orders"))
            .await
            .unwrap());
        assert_eq!(oracle.calls(), 2);
    }
}
