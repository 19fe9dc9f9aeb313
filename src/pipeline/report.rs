use crate::decision::RebuildDecision;
use serde::Serialize;

/// Outcome of one orchestration run, in folder order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub folders: Vec<FolderOutcome>,
}

impl BuildReport {
    pub fn built(&self) -> usize {
        self.folders.iter().filter(|f| f.published.is_some()).count()
    }

    pub fn skipped(&self) -> usize {
        self.folders.len() - self.built()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderOutcome {
    #[serde(flatten)]
    pub decision: RebuildDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedImage>,
}

/// Tags pushed for a rebuilt folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedImage {
    pub unique: String,
    pub latest: String,
    /// Registration symbols wired into the entrypoint, sorted
    pub services: Vec<String>,
}
