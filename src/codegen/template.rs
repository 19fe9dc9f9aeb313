//! Entrypoint template with a single `$services` substitution point
//!
//! Placeholder syntax: `$services` or `${services}`; `$$` is a literal `$`.
//! Any other placeholder is rejected when the template is parsed, so rendering
//! itself cannot fail.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const SERVICES_PLACEHOLDER: &str = "services";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '${name}' on line {line}")]
    UnknownPlaceholder { name: String, line: usize },

    #[error("invalid placeholder on line {line}, column {column}")]
    InvalidPlaceholder { line: usize, column: usize },
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
        )
        .expect("valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Services,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointTemplate {
    segments: Vec<Segment>,
}

impl EntrypointTemplate {
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(text) {
            let whole = caps.get(0).expect("group 0 always participates");
            literal.push_str(&text[last..whole.start()]);
            last = whole.end();

            if caps.name("escaped").is_some() {
                literal.push('$');
                continue;
            }

            let name = caps.name("named").or_else(|| caps.name("braced"));
            match name {
                Some(name) if name.as_str() == SERVICES_PLACEHOLDER => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Services);
                }
                Some(name) => {
                    return Err(TemplateError::UnknownPlaceholder {
                        name: name.as_str().to_string(),
                        line: line_of(text, whole.start()),
                    });
                }
                None => {
                    let (line, column) = position_of(text, whole.start());
                    return Err(TemplateError::InvalidPlaceholder { line, column });
                }
            }
        }

        literal.push_str(&text[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn has_placeholder(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Services))
    }

    /// Substitutes `block` at every placeholder
    pub fn render(&self, block: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Services => block,
            })
            .collect()
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    position_of(text, offset).0
}

fn position_of(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
    (line, column)
}
