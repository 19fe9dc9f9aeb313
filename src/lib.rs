//! protogate - change-driven gRPC gateway image builder
//!
//! For each proto folder in a repository, protogate decides whether a new
//! gateway image is needed, generates the gateway sources with a protocol
//! compiler, wires every generated service into the gateway entrypoint and
//! publishes the image.
//!
//! # Core Concepts
//!
//! - **Rebuild decision**: forced, never published (no `-latest` tag in the
//!   registry), or changed between `HEAD~1` and `HEAD`
//! - **Service extraction**: `Register<Service>HandlerFromEndpoint` symbols
//!   found in generated `*.pb.gw.go` files, deduplicated and sorted
//! - **Entrypoint synthesis**: one registration call per service substituted
//!   into the `$services` placeholder of the entrypoint template
//! - **Collaborators**: [`vcs::ChangeOracle`], [`registry::ImageExistenceProbe`],
//!   [`registry::ImagePublisher`] and [`generator::ProtoCompiler`] are traits
//!   with production and mock implementations
//!
//! # Example Usage
//!
//! ```no_run
//! use protogate::generator::CommandCompiler;
//! use protogate::pipeline::{BuildOrchestrator, BuildRequest};
//! use protogate::registry::DockerRegistry;
//! use protogate::vcs::GitChangeOracle;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(DockerRegistry::connect()?);
//! let orchestrator = BuildOrchestrator::new(
//!     registry.clone(),
//!     Arc::new(GitChangeOracle::new()),
//!     Arc::new(CommandCompiler::buf()),
//!     registry,
//! );
//!
//! let report = orchestrator
//!     .run(&BuildRequest {
//!         repo_root: PathBuf::from("."),
//!         folders: vec![PathBuf::from("protos/users")],
//!         docker_repository: "registry.example.com/gateway".to_string(),
//!         tag_prefix: "grpc-gateway-".to_string(),
//!         force_rebuild: false,
//!     })
//!     .await?;
//! println!("built {} folder(s)", report.built());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codegen;
pub mod config;
pub mod decision;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod staging;
pub mod tag;
pub mod util;
pub mod vcs;

pub use codegen::{EntrypointSynthesizer, EntrypointTemplate, ServiceExtractor, ServiceRegistration};
pub use config::{ConfigError, ProtogateConfig};
pub use decision::{RebuildDecider, RebuildDecision, RebuildReason};
pub use error::{BuildError, ErrorKind, Result};
pub use pipeline::{BuildOrchestrator, BuildReport, BuildRequest, Timeouts};
pub use tag::{ImageRef, ImageTags};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "protogate");
    }
}
