//! Image references and the tag scheme used for each proto folder
//!
//! Each folder gets a stable partial tag (`<prefix><folder_id>`). A successful
//! build publishes two tags derived from it: an immutable timestamped tag and a
//! floating `-latest` tag that doubles as the "has this folder ever been built"
//! oracle for the next run.

use crate::error::{BuildError, Result};
use serde::Serialize;
use std::fmt;

const LATEST_SUFFIX: &str = "-latest";
const MAX_TAG_LEN: usize = 128;

/// Fully qualified `repository:tag` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Tags derived for one folder in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTags {
    partial: String,
}

impl ImageTags {
    /// Builds the tag family for `folder_id`, rejecting text Docker would refuse
    pub fn new(prefix: &str, folder_id: &str) -> Result<Self> {
        let partial = format!("{}{}", prefix, folder_id);
        validate_tag(&format!("{}{}", partial, LATEST_SUFFIX))?;
        Ok(Self { partial })
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Floating tag pointing at the most recent successful build
    pub fn latest(&self) -> String {
        format!("{}{}", self.partial, LATEST_SUFFIX)
    }

    /// Immutable tag recording the build minted at `unix_secs`
    pub fn timestamped(&self, unix_secs: i64) -> String {
        format!("{}-{}", self.partial, unix_secs)
    }

    /// Timestamped tag for the current wall-clock second
    pub fn mint(&self) -> String {
        self.timestamped(chrono::Utc::now().timestamp())
    }
}

/// Checks a tag against the Docker grammar `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
pub fn validate_tag(tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid_first = chars
        .next()
        .map(|c| c.is_ascii_alphanumeric() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid_first || !valid_rest || tag.len() > MAX_TAG_LEN {
        return Err(BuildError::input(format!(
            "'{}' is not a valid image tag (allowed: letters, digits, '_', '.', '-'; max {} chars)",
            tag, MAX_TAG_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_family() {
        let tags = ImageTags::new("grpc-gateway-", "svc1").unwrap();
        assert_eq!(tags.partial(), "grpc-gateway-svc1");
        assert_eq!(tags.latest(), "grpc-gateway-svc1-latest");
        assert_eq!(tags.timestamped(1_700_000_000), "grpc-gateway-svc1-1700000000");
    }

    #[test]
    fn test_minted_tag_is_distinct_from_latest() {
        let tags = ImageTags::new("gw-", "users.v1").unwrap();
        let unique = tags.mint();
        assert!(unique.starts_with("gw-users.v1-"));
        assert_ne!(unique, tags.latest());
    }

    #[test]
    fn test_image_ref_display() {
        let reference = ImageRef::new("registry.local/gateways", "gw-svc-latest");
        assert_eq!(reference.to_string(), "registry.local/gateways:gw-svc-latest");
    }

    #[test]
    fn test_invalid_tags_are_input_errors() {
        assert!(matches!(
            ImageTags::new("bad prefix ", "svc"),
            Err(BuildError::Input(_))
        ));
        assert!(ImageTags::new("", ".hidden").is_err());
        assert!(ImageTags::new(&"x".repeat(130), "svc").is_err());
    }
}
