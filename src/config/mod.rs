use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::OutputFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External caption download tool
    pub tool: ToolConfig,

    /// Defaults for options not given on the command line
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name or path of yt-dlp
    pub program: String,

    /// Hard limit on a single tool run, in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Caption language tag
    pub language: String,

    /// Output format
    pub format: OutputFormat,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            format: OutputFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./config.yaml` and then the
    /// user config directory are tried, falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_path(),
        };

        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading configuration from {}", path.display());

        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    fn discover_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.is_file() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("yt-captions").join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tool.program.trim().is_empty() {
            anyhow::bail!("tool.program must not be empty");
        }

        if self.tool.timeout_secs == 0 {
            anyhow::bail!("tool.timeout_secs must be greater than zero");
        }

        if self.defaults.language.trim().is_empty() {
            anyhow::bail!("defaults.language must not be empty");
        }

        Ok(())
    }

    /// Tool timeout as a [`Duration`]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool.timeout_secs)
    }
}
