//! Container registry collaborators
//!
//! Two seams live here:
//!
//! - [`ImageExistenceProbe`] answers whether a `repository:tag` manifest
//!   exists remotely. "Not found" is `Ok(false)`; every other failure is an
//!   error, so an auth problem is never mistaken for "already built".
//! - [`ImagePublisher`] builds an image from a staged context directory, pushes
//!   tags and retags an existing image.
//!
//! [`DockerRegistry`] implements both against the Docker Engine API.
//! [`MockRegistry`] is an in-memory stand-in for tests.

mod docker;
mod mock;

pub use docker::{check_docker, DockerRegistry};
pub use mock::{MockRegistry, PublishCall};

use crate::error::Result;
use crate::tag::ImageRef;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

#[async_trait]
pub trait ImageExistenceProbe: Send + Sync {
    async fn exists(&self, reference: &ImageRef) -> Result<bool>;
}

/// Handle to an image produced by [`ImagePublisher::build`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Image id reported by the builder, when available
    pub id: Option<String>,
    /// Reference the image was tagged with at build time
    pub reference: ImageRef,
}

impl ImageHandle {
    /// Name usable as a source for retagging
    pub fn source_name(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.reference.to_string())
    }
}

#[async_trait]
pub trait ImagePublisher: Send + Sync {
    async fn build(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        build_args: &HashMap<String, String>,
        reference: &ImageRef,
    ) -> Result<ImageHandle>;

    async fn push(&self, reference: &ImageRef) -> Result<()>;

    async fn retag(&self, image: &ImageHandle, reference: &ImageRef) -> Result<()>;
}
