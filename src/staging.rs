//! Scoped staging tree for one orchestration run
//!
//! [`StagingArea`] owns a temporary directory with one subdirectory per built
//! folder. The directory is removed when the area is dropped, which covers
//! early returns, panics and cancellation of the owning future; [`close`]
//! removes it explicitly and reports cleanup errors on the success path.
//!
//! [`close`]: StagingArea::close

use crate::error::{BuildError, Result};
use crate::pipeline::{ProjectLayout, ProtoFolder, STAGED_DOCKERFILE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("protogate-")
            .tempdir()
            .map_err(|e| BuildError::io(std::env::temp_dir(), e))?;
        debug!(path = %dir.path().display(), "Created staging area");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates `<staging>/<folder id>` with the Dockerfile, template assets and protos
    pub fn stage_folder(
        &self,
        folder: &ProtoFolder,
        repo_root: &Path,
        layout: &ProjectLayout,
    ) -> Result<StagedFolder> {
        let root = self.path().join(&folder.id);
        fs::create_dir(&root).map_err(|e| BuildError::io(&root, e))?;

        let project_dir = root.join(&layout.project_dir_name);
        fs::create_dir(&project_dir).map_err(|e| BuildError::io(&project_dir, e))?;

        copy_file(
            &layout.dockerfile_path(repo_root),
            &root.join(STAGED_DOCKERFILE),
        )?;
        copy_tree(&layout.template_dir_path(repo_root), &project_dir)?;

        for proto in &folder.protos {
            let name = proto
                .file_name()
                .ok_or_else(|| BuildError::input(format!("invalid proto path {}", proto.display())))?;
            copy_file(proto, &project_dir.join(name))?;
        }

        debug!(
            folder = %folder.id,
            protos = folder.protos.len(),
            path = %root.display(),
            "Staged folder"
        );
        Ok(StagedFolder { root, project_dir })
    }

    /// Removes the staging tree, surfacing any cleanup error
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| BuildError::io(path, e))
    }
}

/// One folder's stage: image build context plus the Go project inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFolder {
    /// Build context root (contains the Dockerfile)
    pub root: PathBuf,
    /// Compiler working directory
    pub project_dir: PathBuf,
}

impl StagedFolder {
    /// Generated gateway sources, sorted; none when the generated dir is absent
    pub fn gateway_files(&self, layout: &ProjectLayout) -> Result<Vec<PathBuf>> {
        let generated = self.project_dir.join(&layout.generated_dir);
        if !generated.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&generated).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(generated.as_path()).to_path_buf();
                BuildError::io(path, e.into())
            })?;
            let is_gateway = entry
                .file_name()
                .to_str()
                .map_or(false, |name| name.ends_with(&layout.gateway_suffix));
            if entry.file_type().is_file() && is_gateway {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn entrypoint_template_path(&self, layout: &ProjectLayout) -> PathBuf {
        self.project_dir.join(&layout.entrypoint_template)
    }

    pub fn entrypoint_path(&self, layout: &ProjectLayout) -> PathBuf {
        self.project_dir.join(&layout.entrypoint_file)
    }

    pub fn read_entrypoint_template(&self, layout: &ProjectLayout) -> Result<String> {
        let path = self.entrypoint_template_path(layout);
        fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))
    }

    /// Writes the synthesized program and deletes the raw template
    pub fn write_entrypoint(&self, layout: &ProjectLayout, program: &str) -> Result<PathBuf> {
        let entrypoint = self.entrypoint_path(layout);
        fs::write(&entrypoint, program).map_err(|e| BuildError::io(&entrypoint, e))?;

        let template = self.entrypoint_template_path(layout);
        fs::remove_file(&template).map_err(|e| BuildError::io(&template, e))?;
        Ok(entrypoint)
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| BuildError::io(from, e))?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(|e| BuildError::io(from, e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| BuildError::input(format!("unexpected path {}", entry.path().display())))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::io(&target, e))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}
