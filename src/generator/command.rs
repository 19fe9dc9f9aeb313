use super::{CompilerOutput, ProtoCompiler};
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Runs an external compiler command, `buf generate` by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace-separated command line such as `buf generate`
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| BuildError::input("protocol compiler command is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn buf() -> Self {
        Self::new("buf", vec!["generate".to_string()])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl ProtoCompiler for CommandCompiler {
    async fn compile(&self, workdir: &Path) -> Result<CompilerOutput> {
        debug!(command = %self.describe(), workdir = %workdir.display(), "Running protocol compiler");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BuildError::Generation {
                status: format!("could not start '{}'", self.program),
                stdout: String::new(),
                stderr: e.to_string(),
            })?;

        Ok(CompilerOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_command_line() {
        let compiler = CommandCompiler::from_command_line("buf generate --template buf.gen.yaml")
            .unwrap();
        assert_eq!(compiler.program(), "buf");
        assert_eq!(compiler.args(), ["generate", "--template", "buf.gen.yaml"]);
        assert_eq!(compiler.describe(), "buf generate --template buf.gen.yaml");
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        assert!(matches!(
            CommandCompiler::from_command_line("   "),
            Err(BuildError::Input(_))
        ));
    }

    #[test]
    fn test_default_is_buf_generate() {
        assert_eq!(CommandCompiler::buf().describe(), "buf generate");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_streams_and_status() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo out; echo err >&2; exit 3".to_string(),
            ],
        );

        let output = compiler.compile(dir.path()).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_workdir() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new("sh", vec!["-c".to_string(), "touch marker".to_string()]);

        let output = compiler.compile(dir.path()).await.unwrap();
        assert!(output.is_success());
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_generation_error() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new("definitely-not-a-real-compiler-binary", vec![]);
        let err = compiler.compile(dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Generation { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Generation);
        assert!(err.to_string().contains("definitely-not-a-real-compiler-binary"));
    }
}
