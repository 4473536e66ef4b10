use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::error::{IssuedeckError, Result};
use crate::github::DEFAULT_ENDPOINT;

pub const DEFAULT_PATH: &str = "apollographql/apollo-client";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub default_path: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_path: DEFAULT_PATH.to_string(),
            token_env: Some("GITHUB_TOKEN".to_string()),
            token_command: Some("gh auth token".to_string()),
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("issuedeck"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        Self::parse(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
            Config::default()
        })
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| IssuedeckError::Config(e.to_string()))
    }

    /// Apply command-line overrides and check the result is usable.
    pub fn with_overrides(mut self, path: Option<String>, endpoint: Option<String>) -> Result<Self> {
        if let Some(path) = path {
            self.default_path = path;
        }
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        reqwest::Url::parse(&self.endpoint).map_err(|e| {
            IssuedeckError::Config(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;

        Ok(self)
    }
}
