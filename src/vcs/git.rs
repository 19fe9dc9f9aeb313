use super::{relative_subtree, ChangeOracle};
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// [`ChangeOracle`] backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitChangeOracle {
    git_binary: PathBuf,
}

impl Default for GitChangeOracle {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
        }
    }
}

impl GitChangeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(git_binary: impl Into<PathBuf>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    async fn git(&self, repo: &Path, args: &[&str]) -> Result<std::process::Output> {
        Command::new(&self.git_binary)
            .arg("-C")
            .arg(repo)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                BuildError::repository(format!(
                    "failed to run {} in {}: {}",
                    self.git_binary.display(),
                    repo.display(),
                    e
                ))
            })
    }

    async fn resolve(&self, repo: &Path, revision: &str) -> Result<String> {
        let spec = format!("{}^{{commit}}", revision);
        let output = self
            .git(repo, &["rev-parse", "--verify", "--quiet", &spec])
            .await?;

        if !output.status.success() {
            let hint = if revision.contains('~') {
                " (shallow clone or single-commit history?)"
            } else {
                ""
            };
            return Err(BuildError::repository(format!(
                "revision {} does not exist in {}{}",
                revision,
                repo.display(),
                hint
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ChangeOracle for GitChangeOracle {
    async fn has_changed(&self, repo: &Path, subtree: &Path) -> Result<bool> {
        let subtree = relative_subtree(subtree);

        let head = self.resolve(repo, "HEAD").await?;
        let parent = self.resolve(repo, "HEAD~1").await?;
        debug!(%head, %parent, subtree = %subtree.display(), "Diffing subtree");

        let subtree_arg = subtree.to_string_lossy();
        // --exit-code: 0 unchanged, 1 changed; user diff drivers must not affect it
        let output = self
            .git(
                repo,
                &[
                    "diff",
                    "--quiet",
                    "--exit-code",
                    "--no-ext-diff",
                    "--no-textconv",
                    &parent,
                    &head,
                    "--",
                    &subtree_arg,
                ],
            )
            .await?;

        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(BuildError::repository(format!(
                "git diff of {} failed: {}",
                subtree.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}
