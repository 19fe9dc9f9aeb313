//! Error taxonomy for build orchestration
//!
//! Every failure terminates the affected unit of work. Errors raised while
//! processing a folder are wrapped in [`BuildError::Folder`] so the operator
//! sees which folder and which step failed without re-running.

use crate::codegen::TemplateError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// External collaborator that may be subject to a caller-imposed timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    /// Protocol compiler process (e.g. `buf generate`)
    ProtoCompiler,
    /// Image build, push and retag operations
    ImagePublisher,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::ProtoCompiler => "protocol compiler",
            Collaborator::ImagePublisher => "image publisher",
        };
        f.write_str(name)
    }
}

/// Orchestration step in which a folder-level failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Decide,
    Stage,
    Generate,
    Extract,
    Synthesize,
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Decide => "rebuild decision",
            Step::Stage => "staging",
            Step::Generate => "gateway generation",
            Step::Extract => "service extraction",
            Step::Synthesize => "entrypoint synthesis",
            Step::Publish => "image publish",
        };
        f.write_str(name)
    }
}

/// Coarse classification used for exit codes and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Repository,
    Registry,
    Generation,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Process exit code reported by the CLI for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Input => 2,
            ErrorKind::Repository => 3,
            ErrorKind::Registry => 4,
            ErrorKind::Generation => 5,
            ErrorKind::Cancelled => 130,
            ErrorKind::Internal => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// Missing or empty folder, malformed arguments, missing layout assets
    #[error("Input error: {0}")]
    Input(String),

    /// Version control inspection failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// Registry lookup, image build, push or tag failed
    #[error("Registry error for {reference}: {message}")]
    Registry { reference: String, message: String },

    /// The protocol compiler could not start or exited unsuccessfully
    #[error(
        "Gateway generation failed ({status})\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}"
    )]
    Generation {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("{collaborator} timed out after {seconds} seconds")]
    CollaboratorTimeout {
        collaborator: Collaborator,
        seconds: u64,
    },

    #[error("Entrypoint synthesis failed: {0}")]
    Synthesis(#[from] TemplateError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Folder '{folder}' failed during {step}: {source}")]
    Folder {
        folder: String,
        step: Step,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    pub fn input(message: impl Into<String>) -> Self {
        BuildError::Input(message.into())
    }

    pub fn repository(message: impl Into<String>) -> Self {
        BuildError::Repository(message.into())
    }

    pub fn registry(reference: impl fmt::Display, message: impl Into<String>) -> Self {
        BuildError::Registry {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches folder and step context
    pub fn in_folder(self, folder: &str, step: Step) -> Self {
        BuildError::Folder {
            folder: folder.to_string(),
            step,
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Input(_) => ErrorKind::Input,
            BuildError::Repository(_) => ErrorKind::Repository,
            BuildError::Registry { .. } => ErrorKind::Registry,
            BuildError::Generation { .. } => ErrorKind::Generation,
            BuildError::CollaboratorTimeout { collaborator, .. } => match collaborator {
                Collaborator::ProtoCompiler => ErrorKind::Generation,
                Collaborator::ImagePublisher => ErrorKind::Registry,
            },
            BuildError::Synthesis(_) | BuildError::Io { .. } => ErrorKind::Internal,
            BuildError::Cancelled => ErrorKind::Cancelled,
            BuildError::Folder { source, .. } => source.kind(),
        }
    }

    /// Strips folder context wrappers
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::Folder { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
