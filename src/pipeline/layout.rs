use crate::error::{BuildError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dockerfile name inside each staged folder
pub const STAGED_DOCKERFILE: &str = "Dockerfile";

/// Where template assets live in the repository and how a stage is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Dockerfile, relative to the repository root
    pub dockerfile: PathBuf,
    /// Directory of template assets, relative to the repository root
    pub template_dir: PathBuf,
    /// Stage subdirectory holding the Go project; also passed as the `project` build arg
    pub project_dir_name: String,
    pub entrypoint_template: String,
    pub entrypoint_file: String,
    /// Where the compiler writes gateway sources, relative to the project directory
    pub generated_dir: PathBuf,
    pub gateway_suffix: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            dockerfile: PathBuf::from("Dockerfile"),
            template_dir: PathBuf::from("template"),
            project_dir_name: "template".to_string(),
            entrypoint_template: "main.go.template".to_string(),
            entrypoint_file: "main.go".to_string(),
            generated_dir: PathBuf::from("gen/go"),
            gateway_suffix: ".pb.gw.go".to_string(),
        }
    }
}

impl ProjectLayout {
    pub fn dockerfile_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.dockerfile)
    }

    pub fn template_dir_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.template_dir)
    }

    pub fn build_args(&self) -> HashMap<String, String> {
        HashMap::from([("project".to_string(), self.project_dir_name.clone())])
    }

    /// Checks that the assets every stage copies are present
    pub fn validate(&self, repo_root: &Path) -> Result<()> {
        let dockerfile = self.dockerfile_path(repo_root);
        if !dockerfile.is_file() {
            return Err(BuildError::input(format!(
                "Dockerfile not found at {}",
                dockerfile.display()
            )));
        }

        let template_dir = self.template_dir_path(repo_root);
        if !template_dir.is_dir() {
            return Err(BuildError::input(format!(
                "template directory not found at {}",
                template_dir.display()
            )));
        }

        let entrypoint_template = template_dir.join(&self.entrypoint_template);
        if !entrypoint_template.is_file() {
            return Err(BuildError::input(format!(
                "entrypoint template not found at {}",
                entrypoint_template.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_complete_layout() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("Dockerfile"), "FROM golang\n").unwrap();
        fs::create_dir(repo.path().join("template")).unwrap();
        fs::write(repo.path().join("template/main.go.template"), "$services").unwrap();

        assert!(ProjectLayout::default().validate(repo.path()).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_template() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("Dockerfile"), "FROM golang\n").unwrap();
        fs::create_dir(repo.path().join("template")).unwrap();

        let err = ProjectLayout::default().validate(repo.path()).unwrap_err();
        assert!(matches!(err, BuildError::Input(msg) if msg.contains("main.go.template")));
    }

    #[test]
    fn test_build_args_name_project_dir() {
        let args = ProjectLayout::default().build_args();
        assert_eq!(args.get("project").map(String::as_str), Some("template"));
    }
}
