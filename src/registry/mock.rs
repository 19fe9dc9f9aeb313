use super::{ImageExistenceProbe, ImageHandle, ImagePublisher};
use crate::error::{BuildError, Result};
use crate::tag::ImageRef;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Publisher operation recorded by [`MockRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishCall {
    Build {
        context_dir: PathBuf,
        dockerfile: String,
        build_args: Vec<(String, String)>,
        reference: ImageRef,
    },
    Push(ImageRef),
    Retag {
        source: ImageRef,
        target: ImageRef,
    },
}

/// In-memory registry: pushed references become visible to the probe
pub struct MockRegistry {
    images: Mutex<HashSet<String>>,
    calls: Mutex<Vec<PublishCall>>,
    probe_calls: AtomicUsize,
    probe_failure: Mutex<Option<String>>,
    publish_failure: Mutex<Option<String>>,
    publish_delay: Mutex<Option<Duration>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            images: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            probe_calls: AtomicUsize::new(0),
            probe_failure: Mutex::new(None),
            publish_failure: Mutex::new(None),
            publish_delay: Mutex::new(None),
        }
    }

    /// Seeds an already-published image
    pub fn add_image(&self, reference: &ImageRef) {
        self.images.lock().unwrap().insert(reference.to_string());
    }

    pub fn contains(&self, reference: &ImageRef) -> bool {
        self.images.lock().unwrap().contains(&reference.to_string())
    }

    /// Makes the probe fail (e.g. simulated auth error)
    pub fn fail_probe(&self, message: impl Into<String>) {
        *self.probe_failure.lock().unwrap() = Some(message.into());
    }

    /// Makes build, push and retag fail
    pub fn fail_publish(&self, message: impl Into<String>) {
        *self.publish_failure.lock().unwrap() = Some(message.into());
    }

    /// Delays every publisher call, for timeout tests
    pub fn delay_publish(&self, delay: Duration) {
        *self.publish_delay.lock().unwrap() = Some(delay);
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn publish_calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pushed(&self) -> Vec<ImageRef> {
        self.publish_calls()
            .into_iter()
            .filter_map(|call| match call {
                PublishCall::Push(reference) => Some(reference),
                _ => None,
            })
            .collect()
    }

    async fn before_publish(&self, reference: &ImageRef) -> Result<()> {
        let delay = *self.publish_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.publish_failure.lock().unwrap().clone() {
            return Err(BuildError::registry(reference, message));
        }
        Ok(())
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageExistenceProbe for MockRegistry {
    async fn exists(&self, reference: &ImageRef) -> Result<bool> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.probe_failure.lock().unwrap().clone() {
            return Err(BuildError::registry(reference, message));
        }
        Ok(self.contains(reference))
    }
}

#[async_trait]
impl ImagePublisher for MockRegistry {
    async fn build(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        build_args: &HashMap<String, String>,
        reference: &ImageRef,
    ) -> Result<ImageHandle> {
        self.before_publish(reference).await?;

        let mut build_args: Vec<(String, String)> = build_args
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        build_args.sort();

        self.calls.lock().unwrap().push(PublishCall::Build {
            context_dir: context_dir.to_path_buf(),
            dockerfile: dockerfile.to_string(),
            build_args,
            reference: reference.clone(),
        });

        Ok(ImageHandle {
            id: None,
            reference: reference.clone(),
        })
    }

    async fn push(&self, reference: &ImageRef) -> Result<()> {
        self.before_publish(reference).await?;
        self.calls
            .lock()
            .unwrap()
            .push(PublishCall::Push(reference.clone()));
        self.add_image(reference);
        Ok(())
    }

    async fn retag(&self, image: &ImageHandle, reference: &ImageRef) -> Result<()> {
        self.before_publish(reference).await?;
        self.calls.lock().unwrap().push(PublishCall::Retag {
            source: image.reference.clone(),
            target: reference.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pushed_images_become_visible() {
        let registry = MockRegistry::new();
        let reference = ImageRef::new("repo/gw", "svc-latest");

        assert!(!registry.exists(&reference).await.unwrap());
        registry.push(&reference).await.unwrap();
        assert!(registry.exists(&reference).await.unwrap());
        assert_eq!(registry.probe_calls(), 2);
        assert_eq!(registry.pushed(), vec![reference]);
    }

    #[tokio::test]
    async fn test_probe_failure_is_an_error_not_absence() {
        let registry = MockRegistry::new();
        registry.fail_probe("unauthorized");

        let result = registry.exists(&ImageRef::new("repo/gw", "x")).await;
        assert!(matches!(result, Err(BuildError::Registry { .. })));
    }
}
