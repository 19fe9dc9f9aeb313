//! Change detection between the current commit and its parent

mod git;
mod mock;

pub use git::GitChangeOracle;
pub use mock::MockChangeOracle;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Answers whether a repository subtree differs between `HEAD~1` and `HEAD`
#[async_trait]
pub trait ChangeOracle: Send + Sync {
    /// `subtree` is repository-relative; a leading separator is ignored.
    async fn has_changed(&self, repo: &Path, subtree: &Path) -> Result<bool>;
}

/// Makes `subtree` repository-relative by dropping root and prefix components
pub fn relative_subtree(subtree: &Path) -> PathBuf {
    subtree
        .components()
        .filter(|c| {
            !matches!(
                c,
                std::path::Component::RootDir | std::path::Component::Prefix(_)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_subtree_strips_leading_separator() {
        assert_eq!(
            relative_subtree(Path::new("/protos/users")),
            PathBuf::from("protos/users")
        );
        assert_eq!(
            relative_subtree(Path::new("protos/users")),
            PathBuf::from("protos/users")
        );
    }
}
