//! Rebuild-necessity decision for a proto folder
//!
//! Checks run cheapest first and short-circuit:
//!
//! 1. force flag
//! 2. one registry round-trip for the folder's `latest` tag
//! 3. the revision diff of the folder
//!
//! A registry or repository failure aborts the decision instead of defaulting
//! to either branch.

use crate::error::Result;
use crate::pipeline::ProtoFolder;
use crate::registry::ImageExistenceProbe;
use crate::tag::ImageRef;
use crate::vcs::ChangeOracle;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildReason {
    Forced,
    ImageAbsent,
    DiffDetected,
    #[serde(rename = "none")]
    Unchanged,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RebuildReason::Forced => "forced",
            RebuildReason::ImageAbsent => "image-absent",
            RebuildReason::DiffDetected => "diff-detected",
            RebuildReason::Unchanged => "none",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildDecision {
    pub folder_id: String,
    pub should_build: bool,
    pub reason: RebuildReason,
}

impl RebuildDecision {
    fn build(folder_id: &str, reason: RebuildReason) -> Self {
        Self {
            folder_id: folder_id.to_string(),
            should_build: true,
            reason,
        }
    }

    fn skip(folder_id: &str) -> Self {
        Self {
            folder_id: folder_id.to_string(),
            should_build: false,
            reason: RebuildReason::Unchanged,
        }
    }
}

#[derive(Clone)]
pub struct RebuildDecider {
    probe: Arc<dyn ImageExistenceProbe>,
    oracle: Arc<dyn ChangeOracle>,
    repo_root: PathBuf,
}

impl RebuildDecider {
    pub fn new(
        probe: Arc<dyn ImageExistenceProbe>,
        oracle: Arc<dyn ChangeOracle>,
        repo_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe,
            oracle,
            repo_root: repo_root.into(),
        }
    }

    /// `latest` is the folder's floating tag, used as the "ever built" oracle
    pub async fn decide(
        &self,
        folder: &ProtoFolder,
        force_rebuild: bool,
        latest: &ImageRef,
    ) -> Result<RebuildDecision> {
        if force_rebuild {
            return Ok(RebuildDecision::build(&folder.id, RebuildReason::Forced));
        }

        if !self.probe.exists(latest).await? {
            debug!(folder = %folder.id, image = %latest, "No latest image");
            return Ok(RebuildDecision::build(&folder.id, RebuildReason::ImageAbsent));
        }

        if self
            .oracle
            .has_changed(&self.repo_root, &folder.relative_path)
            .await?
        {
            return Ok(RebuildDecision::build(&folder.id, RebuildReason::DiffDetected));
        }

        Ok(RebuildDecision::skip(&folder.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::registry::MockRegistry;
    use crate::vcs::MockChangeOracle;

    fn folder(id: &str) -> ProtoFolder {
        ProtoFolder {
            id: id.to_string(),
            relative_path: PathBuf::from(format!("protos/{}", id)),
            path: PathBuf::from(format!("/repo/protos/{}", id)),
            protos: vec![PathBuf::from(format!("/repo/protos/{}/{}.proto", id, id))],
        }
    }

    fn latest(id: &str) -> ImageRef {
        ImageRef::new("registry/gw", format!("grpc-gateway-{}-latest", id))
    }

    fn decider(registry: &Arc<MockRegistry>, oracle: &Arc<MockChangeOracle>) -> RebuildDecider {
        RebuildDecider::new(registry.clone(), oracle.clone(), "/repo")
    }

    #[tokio::test]
    async fn test_force_skips_all_lookups() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());
        registry.fail_probe("should not be called");
        oracle.fail_with("should not be called");

        let decision = decider(&registry, &oracle)
            .decide(&folder("svc"), true, &latest("svc"))
            .await
            .unwrap();

        assert!(decision.should_build);
        assert_eq!(decision.reason, RebuildReason::Forced);
        assert_eq!(registry.probe_calls(), 0);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_absent_image_builds_without_diff() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());

        let decision = decider(&registry, &oracle)
            .decide(&folder("svc1"), false, &latest("svc1"))
            .await
            .unwrap();

        assert_eq!(decision.reason, RebuildReason::ImageAbsent);
        assert!(decision.should_build);
        assert_eq!(registry.probe_calls(), 1);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_diff_triggers_build() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());
        registry.add_image(&latest("svc"));
        oracle.mark_changed("protos/svc");

        let decision = decider(&registry, &oracle)
            .decide(&folder("svc"), false, &latest("svc"))
            .await
            .unwrap();

        assert_eq!(decision.reason, RebuildReason::DiffDetected);
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_existing_image_is_skipped() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());
        registry.add_image(&latest("svc2"));

        let decision = decider(&registry, &oracle)
            .decide(&folder("svc2"), false, &latest("svc2"))
            .await
            .unwrap();

        assert!(!decision.should_build);
        assert_eq!(decision.reason, RebuildReason::Unchanged);
        assert_eq!(decision.folder_id, "svc2");
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_without_diff() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());
        registry.fail_probe("401 unauthorized");

        let result = decider(&registry, &oracle)
            .decide(&folder("svc"), false, &latest("svc"))
            .await;

        assert!(matches!(result, Err(BuildError::Registry { .. })));
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_repository_error() {
        let registry = Arc::new(MockRegistry::new());
        let oracle = Arc::new(MockChangeOracle::new());
        registry.add_image(&latest("svc"));
        oracle.fail_with("HEAD~1 missing");

        let result = decider(&registry, &oracle)
            .decide(&folder("svc"), false, &latest("svc"))
            .await;

        assert!(matches!(result, Err(BuildError::Repository(_))));
    }

    #[test]
    fn test_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&RebuildReason::ImageAbsent).unwrap(),
            "\"image-absent\""
        );
        assert_eq!(
            serde_json::to_string(&RebuildReason::Unchanged).unwrap(),
            "\"none\""
        );
        assert_eq!(RebuildReason::DiffDetected.to_string(), "diff-detected");
    }
}
