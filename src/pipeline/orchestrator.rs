use super::folder::ProtoFolder;
use super::layout::{ProjectLayout, STAGED_DOCKERFILE};
use super::report::{BuildReport, FolderOutcome, PublishedImage};
use crate::codegen::{EntrypointSynthesizer, EntrypointTemplate, ServiceExtractor, ServiceSet};
use crate::decision::{RebuildDecider, RebuildDecision};
use crate::error::{BuildError, Collaborator, Result, Step};
use crate::generator::ProtoCompiler;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::registry::{ImageExistenceProbe, ImagePublisher};
use crate::staging::{StagedFolder, StagingArea};
use crate::tag::{ImageRef, ImageTags};
use crate::vcs::ChangeOracle;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Inputs of one orchestration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub repo_root: PathBuf,
    /// Candidate folders, relative to `repo_root`, in processing order
    pub folders: Vec<PathBuf>,
    pub docker_repository: String,
    pub tag_prefix: String,
    pub force_rebuild: bool,
}

impl BuildRequest {
    /// Checks folders, repository name, tag prefix and layout assets
    ///
    /// Touches only the filesystem, so callers can reject bad input before
    /// any collaborator is contacted.
    pub fn validate(&self, layout: &ProjectLayout) -> Result<()> {
        self.targets(layout).map(|_| ())
    }

    fn targets(&self, layout: &ProjectLayout) -> Result<Vec<Target>> {
        if !self.repo_root.is_dir() {
            return Err(BuildError::input(format!(
                "repository folder {} does not exist",
                self.repo_root.display()
            )));
        }
        if self.folders.is_empty() {
            return Err(BuildError::input("no proto folders given"));
        }
        let repository = self.docker_repository.trim();
        if repository.is_empty() || repository.contains(char::is_whitespace) {
            return Err(BuildError::input(format!(
                "'{}' is not a valid docker repository",
                self.docker_repository
            )));
        }

        layout.validate(&self.repo_root)?;

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut targets = Vec::with_capacity(self.folders.len());
        for candidate in &self.folders {
            let folder = ProtoFolder::discover(&self.repo_root, candidate)?;
            if let Some(previous) = seen.insert(folder.id.clone(), candidate.clone()) {
                return Err(BuildError::input(format!(
                    "folders {} and {} share the identifier '{}'",
                    previous.display(),
                    candidate.display(),
                    folder.id
                )));
            }

            let tags = ImageTags::new(&self.tag_prefix, &folder.id)?;
            let latest = ImageRef::new(repository, tags.latest());
            debug!(folder = %folder.id, protos = folder.protos.len(), latest = %latest, "Discovered folder");
            targets.push(Target {
                folder,
                tags,
                latest,
            });
        }
        Ok(targets)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub compile: Duration,
    /// Applied to each build, push and retag call
    pub publish: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            compile: Duration::from_secs(300),
            publish: Duration::from_secs(1800),
        }
    }
}

/// Folder validated during preparation, with its tag family
struct Target {
    folder: ProtoFolder,
    tags: ImageTags,
    latest: ImageRef,
}

pub struct BuildOrchestrator {
    probe: Arc<dyn ImageExistenceProbe>,
    oracle: Arc<dyn ChangeOracle>,
    compiler: Arc<dyn ProtoCompiler>,
    publisher: Arc<dyn ImagePublisher>,
    layout: ProjectLayout,
    timeouts: Timeouts,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl BuildOrchestrator {
    pub fn new(
        probe: Arc<dyn ImageExistenceProbe>,
        oracle: Arc<dyn ChangeOracle>,
        compiler: Arc<dyn ProtoCompiler>,
        publisher: Arc<dyn ImagePublisher>,
    ) -> Self {
        Self {
            probe,
            oracle,
            compiler,
            publisher,
            layout: ProjectLayout::default(),
            timeouts: Timeouts::default(),
            progress_handler: None,
        }
    }

    pub fn with_layout(mut self, layout: ProjectLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    /// Decides, stages, generates and publishes every requested folder
    ///
    /// Folders are processed in request order and the first failure aborts
    /// the run. The staging tree is removed whether the run succeeds, fails or
    /// is dropped mid-flight.
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildReport> {
        let result = self.execute(request).await;
        if let Err(e) = &result {
            self.emit(ProgressEvent::Failed {
                error: e.to_string(),
            });
        }
        result
    }

    /// Computes rebuild decisions without staging or publishing anything
    pub async fn plan(&self, request: &BuildRequest) -> Result<Vec<RebuildDecision>> {
        let targets = self.prepare(request)?;
        let decider = self.decider(request);

        let mut decisions = Vec::with_capacity(targets.len());
        for target in &targets {
            let decision = decider
                .decide(&target.folder, request.force_rebuild, &target.latest)
                .await
                .map_err(|e| e.in_folder(&target.folder.id, Step::Decide))?;
            self.emit(ProgressEvent::DecisionMade {
                decision: decision.clone(),
            });
            decisions.push(decision);
        }
        Ok(decisions)
    }

    async fn execute(&self, request: &BuildRequest) -> Result<BuildReport> {
        let start = Instant::now();
        let targets = self.prepare(request)?;

        info!(
            repo = %request.repo_root.display(),
            folders = targets.len(),
            force = request.force_rebuild,
            "Starting build run"
        );
        self.emit(ProgressEvent::Started {
            repo_path: request.repo_root.display().to_string(),
            folders: targets.len(),
        });

        let decider = self.decider(request);
        let staging = StagingArea::create()?;
        let mut report = BuildReport::default();

        for target in &targets {
            let id = &target.folder.id;
            let decision = decider
                .decide(&target.folder, request.force_rebuild, &target.latest)
                .await
                .map_err(|e| e.in_folder(id, Step::Decide))?;
            self.emit(ProgressEvent::DecisionMade {
                decision: decision.clone(),
            });

            if !decision.should_build {
                self.emit(ProgressEvent::FolderSkipped { folder: id.clone() });
                report.folders.push(FolderOutcome {
                    decision,
                    published: None,
                });
                continue;
            }

            info!(folder = %id, reason = %decision.reason, "Rebuilding folder");
            let published = self.build_folder(request, target, &staging).await?;
            report.folders.push(FolderOutcome {
                decision,
                published: Some(published),
            });
        }

        staging.close()?;

        self.emit(ProgressEvent::Completed {
            built: report.built(),
            skipped: report.skipped(),
            total_time: start.elapsed(),
        });
        Ok(report)
    }

    fn decider(&self, request: &BuildRequest) -> RebuildDecider {
        RebuildDecider::new(self.probe.clone(), self.oracle.clone(), &request.repo_root)
    }

    fn prepare(&self, request: &BuildRequest) -> Result<Vec<Target>> {
        request.targets(&self.layout)
    }

    async fn build_folder(
        &self,
        request: &BuildRequest,
        target: &Target,
        staging: &StagingArea,
    ) -> Result<PublishedImage> {
        let id = &target.folder.id;
        let generation_start = Instant::now();

        let staged = staging
            .stage_folder(&target.folder, &request.repo_root, &self.layout)
            .map_err(|e| e.in_folder(id, Step::Stage))?;

        self.generate(&staged)
            .await
            .map_err(|e| e.in_folder(id, Step::Generate))?;

        let services = self
            .extract(&staged)
            .map_err(|e| e.in_folder(id, Step::Extract))?;
        if services.is_empty() {
            warn!(folder = %id, "No gateway services found; entrypoint registers nothing");
        }

        self.synthesize(&staged, &services)
            .map_err(|e| e.in_folder(id, Step::Synthesize))?;

        self.emit(ProgressEvent::GenerationComplete {
            folder: id.clone(),
            services: services.len(),
            duration: generation_start.elapsed(),
        });

        let unique = ImageRef::new(&target.latest.repository, target.tags.mint());
        self.publish(id, &staged, &unique, &target.latest)
            .await
            .map_err(|e| e.in_folder(id, Step::Publish))?;

        Ok(PublishedImage {
            unique: unique.to_string(),
            latest: target.latest.to_string(),
            services: services.iter().map(|s| s.symbol().to_string()).collect(),
        })
    }

    async fn generate(&self, staged: &StagedFolder) -> Result<()> {
        debug!(
            compiler = %self.compiler.describe(),
            workdir = %staged.project_dir.display(),
            "Running protocol compiler"
        );

        let output = with_timeout(
            Collaborator::ProtoCompiler,
            self.timeouts.compile,
            self.compiler.compile(&staged.project_dir),
        )
        .await?;

        if !output.is_success() {
            return Err(BuildError::Generation {
                status: output.status_text(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    fn extract(&self, staged: &StagedFolder) -> Result<ServiceSet> {
        let files = staged.gateway_files(&self.layout)?;
        debug!(files = files.len(), "Scanning generated gateway sources");
        ServiceExtractor::new().extract(&files)
    }

    fn synthesize(&self, staged: &StagedFolder, services: &ServiceSet) -> Result<()> {
        let text = staged.read_entrypoint_template(&self.layout)?;
        let template = EntrypointTemplate::parse(&text)?;
        if !template.has_placeholder() {
            warn!(
                template = %staged.entrypoint_template_path(&self.layout).display(),
                "Entrypoint template has no $services placeholder"
            );
        }

        let program = EntrypointSynthesizer::new(template).synthesize(services);
        staged.write_entrypoint(&self.layout, &program)?;
        Ok(())
    }

    /// Builds `unique`, pushes it, then moves `latest` onto the same image
    async fn publish(
        &self,
        folder: &str,
        staged: &StagedFolder,
        unique: &ImageRef,
        latest: &ImageRef,
    ) -> Result<()> {
        let limit = self.timeouts.publish;
        let build_args = self.layout.build_args();

        let image = with_timeout(
            Collaborator::ImagePublisher,
            limit,
            self.publisher
                .build(&staged.root, STAGED_DOCKERFILE, &build_args, unique),
        )
        .await?;

        with_timeout(Collaborator::ImagePublisher, limit, self.publisher.push(unique)).await?;
        self.emit(ProgressEvent::ImagePublished {
            folder: folder.to_string(),
            reference: unique.to_string(),
        });

        with_timeout(
            Collaborator::ImagePublisher,
            limit,
            self.publisher.retag(&image, latest),
        )
        .await?;
        with_timeout(Collaborator::ImagePublisher, limit, self.publisher.push(latest)).await?;
        self.emit(ProgressEvent::ImagePublished {
            folder: folder.to_string(),
            reference: latest.to_string(),
        });

        Ok(())
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }
}

/// Runs `fut`, failing with [`BuildError::CollaboratorTimeout`] once `limit` elapses
async fn with_timeout<T, F>(collaborator: Collaborator, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BuildError::CollaboratorTimeout {
            collaborator,
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockCompiler;
    use crate::registry::MockRegistry;
    use crate::vcs::MockChangeOracle;

    fn orchestrator() -> BuildOrchestrator {
        BuildOrchestrator::new(
            Arc::new(MockRegistry::new()),
            Arc::new(MockChangeOracle::new()),
            Arc::new(MockCompiler::new()),
            Arc::new(MockRegistry::new()),
        )
    }

    fn request(repo_root: PathBuf, folders: &[&str]) -> BuildRequest {
        BuildRequest {
            repo_root,
            folders: folders.iter().map(PathBuf::from).collect(),
            docker_repository: "registry.example.com/gateway".to_string(),
            tag_prefix: "grpc-gateway-".to_string(),
            force_rebuild: false,
        }
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout(Collaborator::ProtoCompiler, Duration::from_secs(1), async {
            Ok(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_names_collaborator() {
        let result: Result<()> = with_timeout(
            Collaborator::ImagePublisher,
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(BuildError::CollaboratorTimeout {
                collaborator: Collaborator::ImagePublisher,
                ..
            })
        ));
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.compile, Duration::from_secs(300));
        assert_eq!(timeouts.publish, Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn test_missing_repo_root_is_input_error() {
        let err = orchestrator()
            .run(&request(PathBuf::from("/nonexistent/repo"), &["protos/svc1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Input(_)));
    }

    #[tokio::test]
    async fn test_empty_folder_list_is_input_error() {
        let repo = tempfile::TempDir::new().unwrap();
        let err = orchestrator()
            .plan(&request(repo.path().to_path_buf(), &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Input(msg) if msg.contains("no proto folders")));
    }

    #[tokio::test]
    async fn test_blank_repository_is_input_error() {
        let repo = tempfile::TempDir::new().unwrap();
        let mut req = request(repo.path().to_path_buf(), &["protos/svc1"]);
        req.docker_repository = "  ".to_string();
        let err = orchestrator().plan(&req).await.unwrap_err();
        assert!(matches!(err, BuildError::Input(_)));
    }

    #[test]
    fn test_request_validation_needs_no_collaborators() {
        let repo = tempfile::TempDir::new().unwrap();
        let layout = ProjectLayout::default();

        let err = request(repo.path().to_path_buf(), &[])
            .validate(&layout)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);

        let err = request(PathBuf::from("/nonexistent/repo"), &["protos/svc1"])
            .validate(&layout)
            .unwrap_err();
        assert!(matches!(err, BuildError::Input(msg) if msg.contains("/nonexistent/repo")));
    }
}
