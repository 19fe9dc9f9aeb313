//! Protocol compiler collaborator
//!
//! The compiler runs inside a staged project directory and leaves generated
//! gateway sources under a well-known subpath. Its result is returned as a
//! [`CompilerOutput`] rather than raw process state, so callers decide what a
//! failure means and tests can substitute [`MockCompiler`].

mod command;
mod mock;

pub use command::CommandCompiler;
pub use mock::MockCompiler;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Exit status and captured streams of one compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CompilerOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable status, e.g. `exit status 1`
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[async_trait]
pub trait ProtoCompiler: Send + Sync {
    /// Runs the compiler with `workdir` as its working directory
    async fn compile(&self, workdir: &Path) -> Result<CompilerOutput>;

    /// Short description used in logs
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(CompilerOutput::success("").status_text(), "exit status 0");
        assert!(CompilerOutput::success("").is_success());

        let failed = CompilerOutput::failure(2, "", "boom");
        assert!(!failed.is_success());
        assert_eq!(failed.status_text(), "exit status 2");

        let signalled = CompilerOutput {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!signalled.is_success());
        assert_eq!(signalled.status_text(), "terminated by signal");
    }
}
