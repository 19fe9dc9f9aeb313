//! Subcommand handlers; each returns the process exit code

use super::commands::{BuildArgs, PlanArgs, TargetArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::ProtogateConfig;
use crate::error::{BuildError, ErrorKind};
use crate::generator::CommandCompiler;
use crate::pipeline::{BuildOrchestrator, BuildRequest};
use crate::progress::LoggingHandler;
use crate::registry::{check_docker, DockerRegistry};
use crate::vcs::GitChangeOracle;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

pub async fn handle_build(args: &BuildArgs, quiet: bool) -> i32 {
    let (orchestrator, request) = match setup(&args.target).await {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    match until_cancelled(orchestrator.run(&request)).await {
        Ok(report) => {
            info!(
                built = report.built(),
                skipped = report.skipped(),
                "Build finished"
            );
            let format: OutputFormat = args.target.format.into();
            if quiet && format == OutputFormat::Human {
                return 0;
            }
            print_or_fail(OutputFormatter::new(format).format_report(&report))
        }
        Err(e) => report_error(&e),
    }
}

pub async fn handle_plan(args: &PlanArgs) -> i32 {
    let (orchestrator, request) = match setup(&args.target).await {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    match until_cancelled(orchestrator.plan(&request)).await {
        Ok(decisions) => {
            print_or_fail(OutputFormatter::new(args.target.format.into()).format_plan(&decisions))
        }
        Err(e) => report_error(&e),
    }
}

/// Loads configuration, validates the request, then connects to Docker
async fn setup(target: &TargetArgs) -> Result<(BuildOrchestrator, BuildRequest), i32> {
    let mut config = ProtogateConfig::default();
    if let Some(prefix) = &target.tag_prefix {
        config.tag_prefix = prefix.clone();
    }
    let compiler = match config.validate().and_then(|_| config.compiler()) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ErrorKind::Internal.exit_code());
        }
    };
    debug!("{}", config);

    let request = build_request(target, &config);
    request
        .validate(&config.layout())
        .map_err(|e| report_error(&e))?;

    let registry = DockerRegistry::connect().map_err(|e| report_error(&e))?;
    check_docker(registry.client())
        .await
        .map_err(|e| report_error(&e))?;

    let orchestrator = build_orchestrator(&config, compiler, registry);
    Ok((orchestrator, request))
}

fn build_request(target: &TargetArgs, config: &ProtogateConfig) -> BuildRequest {
    BuildRequest {
        repo_root: target.repo_folder.clone(),
        folders: target.proto_folders.clone(),
        docker_repository: target.docker_repository.clone(),
        tag_prefix: config.tag_prefix.clone(),
        force_rebuild: target.rebuild_all,
    }
}

fn build_orchestrator(
    config: &ProtogateConfig,
    compiler: CommandCompiler,
    registry: DockerRegistry,
) -> BuildOrchestrator {
    let registry = Arc::new(registry);
    BuildOrchestrator::new(
        registry.clone(),
        Arc::new(GitChangeOracle::new()),
        Arc::new(compiler),
        registry,
    )
    .with_layout(config.layout())
    .with_timeouts(config.timeouts())
    .with_progress(Arc::new(LoggingHandler))
}

/// Races `fut` against Ctrl-C; on signal `fut` is dropped, which removes the
/// staging tree and kills any running child process
async fn until_cancelled<T, F>(fut: F) -> crate::error::Result<T>
where
    F: Future<Output = crate::error::Result<T>>,
{
    tokio::select! {
        result = fut => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            error!("Interrupted, aborting run");
            Err(BuildError::Cancelled)
        }
    }
}

fn print_or_fail(formatted: anyhow::Result<String>) -> i32 {
    match formatted {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ErrorKind::Internal.exit_code()
        }
    }
}

fn report_error(err: &BuildError) -> i32 {
    eprintln!("Error: {}", err);
    err.kind().exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_until_cancelled_returns_result() {
        let value = until_cancelled(async { Ok::<_, BuildError>(3) }).await.unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_until_cancelled_propagates_error() {
        let result: crate::error::Result<()> = until_cancelled(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Err(BuildError::input("bad folder"))
        })
        .await;
        assert!(matches!(result, Err(BuildError::Input(_))));
    }

    #[test]
    fn test_report_error_maps_kind_to_exit_code() {
        assert_eq!(report_error(&BuildError::input("x")), 2);
        assert_eq!(report_error(&BuildError::repository("x")), 3);
        assert_eq!(report_error(&BuildError::Cancelled), 130);
    }
}
