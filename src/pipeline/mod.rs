pub mod folder;
pub mod layout;
pub mod orchestrator;
pub mod report;

pub use folder::ProtoFolder;
pub use layout::{ProjectLayout, STAGED_DOCKERFILE};
pub use orchestrator::{BuildOrchestrator, BuildRequest, Timeouts};
pub use report::{BuildReport, FolderOutcome, PublishedImage};
