use super::extractor::{ServiceRegistration, ServiceSet};
use super::template::EntrypointTemplate;

/// Indentation of the statements that follow the first one; the template
/// supplies the first statement's indentation itself.
const BODY_INDENT: &str = "\t";

/// Produces the merged gateway entrypoint from a parsed template
#[derive(Debug, Clone)]
pub struct EntrypointSynthesizer {
    template: EntrypointTemplate,
}

impl EntrypointSynthesizer {
    pub fn new(template: EntrypointTemplate) -> Self {
        Self { template }
    }

    /// Registration calls for `services`, in set order
    ///
    /// The first call declares `err`, later calls reassign it, and each call is
    /// followed by an early return so the first failure propagates.
    pub fn render_block(services: &ServiceSet) -> String {
        let mut lines = Vec::new();
        for (i, service) in services.iter().enumerate() {
            let assign = if i == 0 { ":=" } else { "=" };
            lines.push(registration_call(service, assign));
            lines.push("if err != nil {".to_string());
            lines.push(format!("{}return err", BODY_INDENT));
            lines.push("}".to_string());
        }
        lines.join(&format!("\n{}", BODY_INDENT))
    }

    pub fn synthesize(&self, services: &ServiceSet) -> String {
        self.template.render(&Self::render_block(services))
    }
}

fn registration_call(service: &ServiceRegistration, assign: &str) -> String {
    format!(
        "err {} gw.{}(ctx, mux, *flag.String(\"{}\", grpcEndpoint, \"gRPC server endpoint\"), opts)",
        assign,
        service.symbol(),
        service.endpoint_flag()
    )
}
