//! Gateway entrypoint code generation
//!
//! - [`extractor`]: finds `Register<Service>HandlerFromEndpoint` symbols in the
//!   compiler's gateway output
//! - [`template`]: parses the entrypoint template and its `$services` slot
//! - [`synthesizer`]: renders one error-propagating registration call per
//!   service into the template
//!
//! Everything here is pure text processing apart from reading the generated
//! files.

pub mod extractor;
pub mod synthesizer;
pub mod template;

pub use extractor::{ServiceExtractor, ServiceRegistration, ServiceSet};
pub use synthesizer::EntrypointSynthesizer;
pub use template::{EntrypointTemplate, TemplateError, SERVICES_PLACEHOLDER};
