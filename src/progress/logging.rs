//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repo_path, folders } => {
                info!(repo = %repo_path, folders, "Starting gateway build run");
            }
            ProgressEvent::DecisionMade { decision } => {
                debug!(
                    folder = %decision.folder_id,
                    should_build = decision.should_build,
                    reason = %decision.reason,
                    "Rebuild decision"
                );
            }
            ProgressEvent::FolderSkipped { folder } => {
                info!(folder = %folder, "No changes, skipping");
            }
            ProgressEvent::GenerationComplete {
                folder,
                services,
                duration,
            } => {
                debug!(
                    folder = %folder,
                    services,
                    duration_ms = duration.as_millis(),
                    "Gateway generated"
                );
            }
            ProgressEvent::ImagePublished { folder, reference } => {
                info!(folder = %folder, image = %reference, "Image pushed");
            }
            ProgressEvent::Completed {
                built,
                skipped,
                total_time,
            } => {
                info!(
                    built,
                    skipped,
                    total_time_ms = total_time.as_millis(),
                    "Run complete"
                );
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Run failed");
            }
        }
    }
}
