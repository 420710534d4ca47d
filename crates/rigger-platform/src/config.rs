use crate::PlatformError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Which target the CLI talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformConfig {
    /// JSON state document backing the target.
    pub state_file: PathBuf,
    /// Overrides the base domain reported by the target.
    #[serde(default)]
    pub target_base: Option<String>,
}

impl PlatformConfig {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            target_base: None,
        }
    }

    #[must_use]
    pub fn with_target_base(mut self, target_base: &str) -> Self {
        self.target_base = Some(target_base.trim_end_matches('.').to_owned());
        self
    }

    /// Location of the per-user target config, `~/.config/rigger/target.json`.
    pub fn default_path() -> Result<PathBuf, PlatformError> {
        let home = std::env::var("HOME")
            .map_err(|_| PlatformError::Config("HOME not set".to_owned()))?;
        Ok(PathBuf::from(home).join(".config/rigger/target.json"))
    }

    pub fn load_default() -> Result<Self, PlatformError> {
        Self::load(&Self::default_path()?)
    }

    pub fn save_default(&self) -> Result<(), PlatformError> {
        self.save(&Self::default_path()?)
    }

    pub fn load(path: &Path) -> Result<Self, PlatformError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PlatformError::Config(format!("invalid target config: {e}")))
    }

    /// Write the config, creating parent directories. Replaces any existing
    /// file atomically.
    pub fn save(&self, path: &Path) -> Result<(), PlatformError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PlatformError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| PlatformError::Io(e.error))?;
        Ok(())
    }
}
