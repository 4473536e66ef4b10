use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{config_dir, Config};
use crate::error::{IssuedeckError, Result};

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        non_empty(&String::from_utf8_lossy(&output.stdout))
    } else {
        None
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// ~/.config/issuedeck/token
fn token_path() -> Option<PathBuf> {
    Some(config_dir()?.join("token"))
}

fn load_stored_token() -> Option<String> {
    let path = token_path()?;
    non_empty(&std::fs::read_to_string(path).ok()?)
}

fn save_token(token: &str) -> Result<()> {
    match token_path() {
        Some(path) => write_token(&path, token),
        None => Ok(()),
    }
}

fn write_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, token)?;
    Ok(())
}

/// Resolve the bearer token, trying in order:
/// 1. the env var named by `token_env`
/// 2. the stored token file
/// 3. the output of `token_command`, which is then stored
pub fn load_token(config: &Config) -> Result<String> {
    if let Some(env_var) = &config.token_env {
        if let Some(token) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            debug!(source = %env_var, "Using token from environment");
            return Ok(token);
        }
    }

    if let Some(token) = load_stored_token() {
        debug!("Using stored token");
        return Ok(token);
    }

    if let Some(cmd) = &config.token_command {
        if let Some(token) = try_cli_token(cmd) {
            debug!(command = %cmd, "Using token from command");
            if let Err(e) = save_token(&token) {
                warn!(error = %e, "Could not save token");
            }
            return Ok(token);
        }
    }

    Err(IssuedeckError::Auth(format!(
        "No GitHub token found. Set {} or configure a token_command.",
        config.token_env.as_deref().unwrap_or("a token env var")
    )))
}
