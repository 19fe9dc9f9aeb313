use super::{CompilerOutput, ProtoCompiler};
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Compiler stand-in that writes scripted files into the working directory
pub struct MockCompiler {
    files: Mutex<Vec<(PathBuf, String)>>,
    output: Mutex<CompilerOutput>,
    delay: Mutex<Option<Duration>>,
    workdirs: Mutex<Vec<PathBuf>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            output: Mutex::new(CompilerOutput::success("")),
            delay: Mutex::new(None),
            workdirs: Mutex::new(Vec::new()),
        }
    }

    /// Writes `content` to `relative_path` (under the workdir) on every run
    pub fn add_generated_file(&self, relative_path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .lock()
            .unwrap()
            .push((relative_path.into(), content.into()));
    }

    pub fn set_output(&self, output: CompilerOutput) {
        *self.output.lock().unwrap() = output;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Working directories of all runs so far, in order
    pub fn workdirs(&self) -> Vec<PathBuf> {
        self.workdirs.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.workdirs.lock().unwrap().len()
    }
}

impl Default for MockCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtoCompiler for MockCompiler {
    async fn compile(&self, workdir: &Path) -> Result<CompilerOutput> {
        self.workdirs.lock().unwrap().push(workdir.to_path_buf());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let output = self.output.lock().unwrap().clone();
        if !output.is_success() {
            return Ok(output);
        }

        let files = self.files.lock().unwrap().clone();
        for (relative, content) in files {
            let path = workdir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| BuildError::io(&path, e))?;
        }

        Ok(output)
    }

    fn describe(&self) -> String {
        "mock compiler".to_string()
    }
}
