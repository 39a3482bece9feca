use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TraceError};
use crate::patterns::ExtractionMode;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRACECHECK_CONFIG";

/// Config file looked up in the specification directory
pub const CONFIG_FILE_NAME: &str = "tracecheck.yaml";

/// Names of the documents in a specification directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub blueprint: String,
    pub requirements: String,
    pub tasks: String,
    pub research: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            blueprint: "blueprint.md".to_string(),
            requirements: "requirements.md".to_string(),
            tasks: "tasks.md".to_string(),
            research: "research.md".to_string(),
        }
    }
}

/// Per-project settings, every field optional in the YAML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub files: FileNames,
    /// Criterion extraction used by `validate`
    pub validate_mode: ExtractionMode,
    /// Criterion extraction used by `trace`
    pub trace_mode: ExtractionMode,
    /// Uncited claims listed in the traceability report before truncating
    pub max_listed_claims: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            files: FileNames::default(),
            validate_mode: ExtractionMode::Strict,
            trace_mode: ExtractionMode::Lenient,
            max_listed_claims: 5,
        }
    }
}

impl ProjectConfig {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TraceError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| TraceError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config for a specification directory, falling back to defaults
    pub fn load_for(dir: &Path) -> Result<Self> {
        let path = get_config_path(dir);
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Writes a default config file, refusing to replace an existing one
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(TraceError::ConfigWrite {
                path: path.to_path_buf(),
                message: "file already exists".to_string(),
            });
        }

        let content =
            serde_yaml::to_string(&Self::default()).map_err(|e| TraceError::ConfigWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TraceError::ConfigWrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        fs::write(path, content).map_err(|e| TraceError::ConfigWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Gets the path to the config file for a specification directory
pub fn get_config_path(dir: &Path) -> PathBuf {
    resolve_config_path(dir, std::env::var(CONFIG_ENV_VAR).ok())
}

fn resolve_config_path(dir: &Path, env_override: Option<String>) -> PathBuf {
    match env_override {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => dir.join(CONFIG_FILE_NAME),
    }
}
