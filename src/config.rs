use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const CONFIG_FILE: &str = ".pr-metrics.toml";
const TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GitHub token not found: set {TOKEN_ENV} or [github] token in {CONFIG_FILE}")]
    MissingToken,
}

/// Top-level configuration loaded from .pr-metrics.toml.
///
/// The file is optional; everything falls back to environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to the GITHUB_ACCESS_TOKEN
    /// env var.
    pub token: Option<String>,
}

impl Config {
    /// Load configuration from .pr-metrics.toml in the current directory,
    /// returning defaults if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence, then
    /// the env var. A missing token is a startup failure — no network call
    /// is attempted without one.
    pub fn github_token(&self) -> Result<String, ConfigError> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .ok_or(ConfigError::MissingToken)
    }
}
