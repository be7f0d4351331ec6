//! Project discovery and initialization
//!
//! A project is any directory containing a `.psvt/` marker directory.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".psvt";

const CONFIG_TEMPLATE: &str = "\
# psvt project configuration
# user: jdoe
# log_level: warn
workflow:
  # Refuse backward moves out of a terminal stage (issued / approved)
  lock_terminal: false
  # Create revision O1 when a workflow entity is created
  initial_revision: true
";

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ProjectError {
    #[error("not inside a psvt project (no {PROJECT_DIR}/ found from {0})")]
    #[diagnostic(code(psvt::project::not_found), help("run 'psvt init' to create one"))]
    NotFound(PathBuf),

    #[error("a psvt project already exists at {0}")]
    #[diagnostic(code(psvt::project::exists))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(psvt::io))]
    Io(#[from] std::io::Error),
}

/// A discovered project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` until a directory containing `.psvt/` is found
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(|dir| Self {
                root: dir.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create a new project at `root`
    pub fn init(root: &Path, force: bool) -> Result<Self, ProjectError> {
        let marker = root.join(PROJECT_DIR);
        if marker.is_dir() && !force {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&marker)?;
        let config = marker.join("config.yaml");
        if !config.exists() || force {
            fs::write(config, CONFIG_TEMPLATE)?;
        }
        tracing::info!(root = %root.display(), "initialized project");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.psvt/` directory
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.marker_dir().join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_and_discover_from_subdir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();
        assert!(tmp.path().join(".psvt/config.yaml").exists());

        let nested = tmp.path().join("entities/psvs");
        fs::create_dir_all(&nested).unwrap();
        let project = Project::discover_from(&nested).unwrap();
        assert_eq!(project.root(), tmp.path());
    }

    #[test]
    fn test_init_twice_requires_force() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();
        assert!(matches!(
            Project::init(tmp.path(), false),
            Err(ProjectError::AlreadyExists(_))
        ));
        assert!(Project::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_outside_project() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }
}
