use crate::domain::{TargetFile, VersionIdentifier, VersionPrefix};
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name looked up in the project directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "update-version.toml";

/// Placeholder substituted in the commit message template
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Represents the complete configuration for update-version.
///
/// Contains the version prefix, the files carrying the version, and release behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub version: VersionConfig,

    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Configuration for version derivation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersionConfig {
    /// `MAJOR.MINOR` prepended to the commit-count patch number
    #[serde(default = "default_prefix")]
    pub prefix: VersionPrefix,
}

/// Returns the default version prefix.
fn default_prefix() -> VersionPrefix {
    VersionPrefix::new(0, 3)
}

impl Default for VersionConfig {
    fn default() -> Self {
        VersionConfig {
            prefix: default_prefix(),
        }
    }
}

/// One file whose version assignment follows each release.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TargetConfig {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// Name of the assigned variable, e.g. `VERSION` or `__version__`
    pub variable: String,
}

impl TargetConfig {
    pub fn new(path: impl Into<PathBuf>, variable: impl Into<String>) -> Self {
        TargetConfig {
            path: path.into(),
            variable: variable.into(),
        }
    }
}

/// Returns the default version targets.
fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig::new("setup.py", "VERSION"),
        TargetConfig::new("gui_o_matic/__init__.py", "__version__"),
    ]
}

/// Returns the default commit message template.
fn default_commit_message() -> String {
    format!("Version {}", VERSION_PLACEHOLDER)
}

fn default_true() -> bool {
    true
}

/// Configuration for release behavior.
///
/// Controls how commits and tags are created and what happens when a step fails.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Move an existing tag of the same name to the new commit instead of failing
    #[serde(default = "default_true")]
    pub replace_existing_tag: bool,

    /// Refuse to start when tracked files have uncommitted changes
    #[serde(default = "default_true")]
    pub require_clean_tree: bool,

    /// Undo completed steps when a later step fails
    #[serde(default = "default_true")]
    pub rollback_on_failure: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            commit_message: default_commit_message(),
            replace_existing_tag: true,
            require_clean_tree: true,
            rollback_on_failure: true,
        }
    }
}

impl ReleaseConfig {
    /// Render the commit message for `version`
    pub fn commit_message_for(&self, version: &VersionIdentifier) -> String {
        self.commit_message
            .replace(VERSION_PLACEHOLDER, &version.to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: VersionConfig::default(),
            targets: default_targets(),
            release: ReleaseConfig::default(),
        }
    }
}

impl Config {
    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ReleaseError::config("At least one target file is required"));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !is_relative_inside(&target.path) {
                return Err(ReleaseError::config(format!(
                    "Target path must be relative to the repository root: {}",
                    target.path.display()
                )));
            }
            if !seen.insert(target.path.clone()) {
                return Err(ReleaseError::config(format!(
                    "Target file listed twice: {}",
                    target.path.display()
                )));
            }
        }

        if !self.release.commit_message.contains(VERSION_PLACEHOLDER) {
            return Err(ReleaseError::config(format!(
                "commit_message must contain the {} placeholder",
                VERSION_PLACEHOLDER
            )));
        }

        self.target_files().map(|_| ())
    }

    /// Builds the matchers for every configured target.
    pub fn target_files(&self) -> Result<Vec<TargetFile>> {
        self.targets
            .iter()
            .map(|t| TargetFile::new(t.path.clone(), t.variable.clone()))
            .collect()
    }
}

fn is_relative_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `update-version.toml` in the project directory
/// 3. `update-version.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `project_dir` - Directory searched for a project configuration (usually the repository root)
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, project_dir: &Path) -> Result<Config> {
    let path = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else if project_dir.join(CONFIG_FILE_NAME).exists() {
        Some(project_dir.join(CONFIG_FILE_NAME))
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    };

    let config = match path {
        Some(path) => parse_config_file(&path)?,
        None => Config::default(),
    };

    config.validate()?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("Cannot parse {}: {}", path.display(), e)))
}
