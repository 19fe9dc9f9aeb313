use super::{ImageExistenceProbe, ImageHandle, ImagePublisher};
use crate::error::{BuildError, Result};
use crate::tag::ImageRef;
use async_trait::async_trait;
use bollard::errors::Error as DockerError;
use bollard::image::{BuildImageOptions, PushImageOptions, TagImageOptions};
use bollard::Docker;
use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{Either, Full};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DAEMON: &str = "docker daemon";

/// Registry probe and image publisher backed by the local Docker daemon
#[derive(Clone)]
pub struct DockerRegistry {
    docker: Docker,
}

impl DockerRegistry {
    /// Connects using `DOCKER_HOST` or the platform default socket
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| BuildError::registry(DAEMON, format!("failed to connect: {}", e)))?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn client(&self) -> &Docker {
        &self.docker
    }
}

/// Pings the daemon and returns its API version
pub async fn check_docker(docker: &Docker) -> Result<String> {
    let version = docker
        .version()
        .await
        .map_err(|e| BuildError::registry(DAEMON, format!("daemon unavailable: {}", e)))?;
    let api_version = version.api_version.unwrap_or_else(|| "0.0".to_string());
    debug!("Docker API version: {}", api_version);
    Ok(api_version)
}

/// True when the daemon's answer means "no such manifest" rather than a failure
fn is_manifest_absent(status_code: u16, message: &str) -> bool {
    status_code == 404 || message.to_lowercase().contains("manifest unknown")
}

async fn tar_context(context_dir: &Path) -> Result<Vec<u8>> {
    let dir: PathBuf = context_dir.to_path_buf();
    let archived = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let mut builder = tar::Builder::new(Vec::new());
        builder.append_dir_all(".", &dir)?;
        builder.into_inner()
    })
    .await
    .map_err(|e| BuildError::io(context_dir, std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    archived.map_err(|e| BuildError::io(context_dir, e))
}

#[async_trait]
impl ImageExistenceProbe for DockerRegistry {
    async fn exists(&self, reference: &ImageRef) -> Result<bool> {
        let name = reference.to_string();
        match self.docker.inspect_registry_image(&name, None).await {
            Ok(_) => {
                debug!(image = %name, "Manifest found");
                Ok(true)
            }
            Err(DockerError::DockerResponseServerError {
                status_code,
                message,
            }) if is_manifest_absent(status_code, &message) => {
                debug!(image = %name, status_code, "Manifest not found");
                Ok(false)
            }
            Err(e) => Err(BuildError::registry(reference, e.to_string())),
        }
    }
}

#[async_trait]
impl ImagePublisher for DockerRegistry {
    async fn build(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        build_args: &HashMap<String, String>,
        reference: &ImageRef,
    ) -> Result<ImageHandle> {
        let tag = reference.to_string();
        let tar_bytes = tar_context(context_dir).await?;
        info!(image = %tag, context_bytes = tar_bytes.len(), "Building image");

        let buildargs: HashMap<&str, &str> = build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let options = BuildImageOptions {
            dockerfile,
            t: tag.as_str(),
            buildargs,
            rm: true,
            ..Default::default()
        };

        let body = Either::Left(Full::new(Bytes::from(tar_bytes)));
        let mut stream = self.docker.build_image(options, None, Some(body));

        let mut image_id = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(bollard::models::BuildInfo {
                    error: Some(err), ..
                }) => {
                    return Err(BuildError::registry(reference, format!("build failed: {}", err)));
                }
                Ok(bollard::models::BuildInfo {
                    stream: Some(msg), ..
                }) => {
                    let msg = msg.trim();
                    if !msg.is_empty() {
                        debug!("docker build: {}", msg);
                    }
                }
                Ok(bollard::models::BuildInfo { aux: Some(aux), .. }) => {
                    if let Some(id) = aux.id {
                        debug!(image_id = %id, "Built image");
                        image_id = Some(id);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(BuildError::registry(
                        reference,
                        format!("build stream error: {}", e),
                    ));
                }
            }
        }

        Ok(ImageHandle {
            id: image_id,
            reference: reference.clone(),
        })
    }

    async fn push(&self, reference: &ImageRef) -> Result<()> {
        info!(image = %reference, "Pushing image");
        let options = PushImageOptions {
            tag: reference.tag.as_str(),
        };
        let mut stream = self
            .docker
            .push_image(&reference.repository, Some(options), None);

        while let Some(item) = stream.next().await {
            match item {
                Ok(progress) => {
                    if let Some(err) = progress.error {
                        return Err(BuildError::registry(reference, format!("push failed: {}", err)));
                    }
                    if let Some(status) = progress.status {
                        debug!("docker push: {}", status);
                    }
                }
                Err(e) => {
                    return Err(BuildError::registry(
                        reference,
                        format!("push stream error: {}", e),
                    ));
                }
            }
        }

        Ok(())
    }

    async fn retag(&self, image: &ImageHandle, reference: &ImageRef) -> Result<()> {
        let source = image.source_name();
        debug!(source = %source, target = %reference, "Tagging image");
        let options = TagImageOptions {
            repo: reference.repository.as_str(),
            tag: reference.tag.as_str(),
        };
        self.docker
            .tag_image(&source, Some(options))
            .await
            .map_err(|e| BuildError::registry(reference, format!("tag failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_not_found_is_absent() {
        assert!(is_manifest_absent(404, "not found"));
        assert!(is_manifest_absent(
            500,
            "Get https://registry/v2/gw/manifests/x: manifest unknown"
        ));
    }

    #[test]
    fn test_auth_failure_is_not_absent() {
        assert!(!is_manifest_absent(401, "unauthorized: authentication required"));
        assert!(!is_manifest_absent(403, "denied"));
        assert!(!is_manifest_absent(500, "connection refused"));
    }

    #[tokio::test]
    async fn test_tar_context_contains_staged_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        fs::create_dir(dir.path().join("template")).unwrap();
        fs::write(dir.path().join("template/main.go"), "package main\n").unwrap();

        let bytes = tar_context(dir.path()).await.unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();

        assert!(names.iter().any(|n| n.ends_with("Dockerfile")));
        assert!(names.iter().any(|n| n.ends_with("template/main.go")));
    }
}
