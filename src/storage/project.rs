//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, ItemStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a flowboard project. Run 'flow init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# flowboard configuration

# Kind used when --kind is omitted (project, activity, action)
default_kind = "project"

# Priority for new items (low, medium, high)
default_priority = "medium"

# Route status changes of new items through approval
use_workflow = false

[board]
show_completed = true

[user]
# name = "your-name"
"#;

/// A flowboard project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(".flow").is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let flow_dir = root.join(".flow");

        fs::create_dir_all(&flow_dir).with_context(|| {
            format!("Failed to create .flow directory: {}", flow_dir.display())
        })?;

        let config_path = flow_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = flow_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = "# Temp files left by interrupted writes\n*.tmp\n";
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .flow directory path
    pub fn flow_dir(&self) -> PathBuf {
        self.root.join(".flow")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the item store
    pub fn item_store(&self) -> ItemStore {
        ItemStore::for_project(&self.root)
    }
}
