//! Discovery of handler-registration symbols in generated gateway sources
//!
//! grpc-gateway emits one `Register<Service>HandlerFromEndpoint` function per
//! service. Extraction works on identifier tokens rather than free text: a
//! token qualifies only if the *whole* identifier follows that naming
//! convention, so `PreRegisterFooHandlerFromEndpointSuffix` is never split into
//! a match.

use crate::error::{BuildError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

const PREFIX: &str = "Register";
const SUFFIX: &str = "HandlerFromEndpoint";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\p{L}_][\p{L}\p{Nd}_]*").expect("valid regex"))
}

/// A validated `Register<Service>HandlerFromEndpoint` symbol
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceRegistration(String);

impl ServiceRegistration {
    /// Accepts `symbol` only if it matches the naming convention exactly
    pub fn parse(symbol: &str) -> Option<Self> {
        let middle = symbol.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        let well_formed = !middle.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        well_formed.then(|| Self(symbol.to_string()))
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Text between `Register` and `HandlerFromEndpoint`
    pub fn service_name(&self) -> &str {
        &self.0[PREFIX.len()..self.0.len() - SUFFIX.len()]
    }

    /// Command-line flag naming this service's upstream endpoint
    pub fn endpoint_flag(&self) -> String {
        self.service_name().to_lowercase()
    }
}

impl fmt::Display for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated registrations in lexicographic order
pub type ServiceSet = BTreeSet<ServiceRegistration>;

/// Registrations named in one source text
pub fn scan_source(source: &str) -> impl Iterator<Item = ServiceRegistration> + '_ {
    identifier_pattern()
        .find_iter(source)
        .filter_map(|token| ServiceRegistration::parse(token.as_str()))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceExtractor;

impl ServiceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Collects the registrations across `files`
    ///
    /// An empty result is not an error: the compiler may legitimately produce
    /// no gateway for a folder.
    pub fn extract<P: AsRef<Path>>(&self, files: &[P]) -> Result<ServiceSet> {
        let mut services = ServiceSet::new();

        for file in files {
            let path = file.as_ref();
            let source = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
            let before = services.len();
            services.extend(scan_source(&source));
            debug!(
                file = %path.display(),
                new_services = services.len() - before,
                "Scanned gateway source"
            );
        }

        Ok(services)
    }
}
