//! User settings for `socle`, read from `~/.socle.toml`.

use crate::{
    constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_REMOTE, SOCLE_CFG_FILE_NAME},
    errors::{StError, StResult},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

/// User-level settings.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SocleConfig {
    /// The GitHub personal access token. Overridden by `GITHUB_TOKEN`.
    pub github_token: String,
    /// The remote branches are pushed to, and whose URL names the GitHub repository.
    pub remote: String,
    /// Client-side timeout for each GitHub API call, in seconds.
    pub api_timeout_secs: u64,
    /// Restack branches before submitting them by default.
    pub restack: bool,
    /// Open new pull requests as drafts by default.
    pub draft: bool,
}

impl Default for SocleConfig {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            remote: DEFAULT_REMOTE.to_string(),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            restack: false,
            draft: false,
        }
    }
}

impl SocleConfig {
    /// Returns the path of the settings file.
    pub fn path() -> StResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(SOCLE_CFG_FILE_NAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine the home directory.").into())
    }

    /// Loads the settings file, falling back to defaults if it does not exist.
    pub fn load() -> StResult<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> StResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file; using defaults");
            return Ok(Self::default());
        }
        Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
    }

    /// Writes the settings to `path`.
    pub fn save_to(&self, path: &Path) -> StResult<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Returns the GitHub token, preferring `override_token` when it is set and non-empty.
    pub fn token(&self, override_token: Option<&str>) -> StResult<String> {
        override_token
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| (!self.github_token.is_empty()).then(|| self.github_token.clone()))
            .ok_or_else(|| {
                let path = Self::path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| SOCLE_CFG_FILE_NAME.to_string());
                StError::MissingToken(path)
            })
    }

    /// Returns the API timeout as a [Duration].
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.max(1))
    }
}
