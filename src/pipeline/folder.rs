use crate::error::{BuildError, Result};
use crate::vcs::relative_subtree;
use std::fs;
use std::path::{Path, PathBuf};

/// A proto-definition folder selected for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoFolder {
    /// Final path segment; drives tags and the staging subdirectory name
    pub id: String,
    /// Path relative to the repository root
    pub relative_path: PathBuf,
    pub path: PathBuf,
    /// `.proto` files directly inside the folder, sorted
    pub protos: Vec<PathBuf>,
}

impl ProtoFolder {
    /// Resolves `candidate` under `repo_root` and collects its `.proto` files
    pub fn discover(repo_root: &Path, candidate: &Path) -> Result<Self> {
        let relative_path = relative_subtree(candidate);
        let path = repo_root.join(&relative_path);

        if !path.exists() {
            return Err(BuildError::input(format!(
                "folder {} does not exist in repository {}",
                candidate.display(),
                repo_root.display()
            )));
        }
        if !path.is_dir() {
            return Err(BuildError::input(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let id = relative_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BuildError::input(format!(
                    "cannot derive a folder identifier from {}",
                    candidate.display()
                ))
            })?;

        let protos = list_protos(&path)?;
        if protos.is_empty() {
            return Err(BuildError::input(format!(
                "folder {} does not contain any .proto files",
                candidate.display()
            )));
        }

        Ok(Self {
            id,
            relative_path,
            path,
            protos,
        })
    }
}

fn list_protos(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut protos = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "proto") {
            protos.push(path);
        }
    }
    protos.sort();
    Ok(protos)
}
