//! Progress handler trait and events

use crate::decision::RebuildDecision;
use std::time::Duration;

/// Events emitted while an orchestration run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Inputs validated, run starting
    Started { repo_path: String, folders: usize },

    /// Rebuild decision computed for a folder
    DecisionMade { decision: RebuildDecision },

    /// Folder needs no rebuild
    FolderSkipped { folder: String },

    /// Compiler ran and the entrypoint was synthesized
    GenerationComplete {
        folder: String,
        services: usize,
        duration: Duration,
    },

    /// A tag was pushed to the registry
    ImagePublished { folder: String, reference: String },

    /// Run finished successfully
    Completed {
        built: usize,
        skipped: usize,
        total_time: Duration,
    },

    /// Run aborted
    Failed { error: String },
}

pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RebuildReason;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repo_path: "/repo".to_string(),
            folders: 2,
        });
        handler.on_progress(&ProgressEvent::DecisionMade {
            decision: RebuildDecision {
                folder_id: "svc".to_string(),
                should_build: true,
                reason: RebuildReason::Forced,
            },
        });
        handler.on_progress(&ProgressEvent::Completed {
            built: 1,
            skipped: 1,
            total_time: Duration::from_secs(3),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Failed {
            error: "boom".to_string(),
        });
    }
}
