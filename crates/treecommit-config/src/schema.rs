// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Configuration schema
//!
//! Every section has serde defaults so a partial file (or no file at all)
//! deserializes into a usable configuration; environment inputs are layered
//! on top by [`crate::ConfigLoader`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Commit message used when none is configured
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update files via treecommit";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target repository as `owner/name`
    pub repository: Option<String>,

    /// Per-run inputs
    pub inputs: InputsConfig,

    /// Remote API settings
    pub api: ApiConfig,

    /// Blob upload tuning
    pub upload: UploadConfig,

    /// Logging settings
    pub observability: ObservabilityConfig,
}

impl Config {
    /// The configured repository identity, or an error naming the missing field
    pub fn require_repository(&self) -> ConfigResult<&str> {
        self.repository
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("repository".to_string()))
    }

    /// Base directory for file paths: the configured workspace, else the
    /// process working directory
    pub fn workspace_dir(&self) -> ConfigResult<PathBuf> {
        match &self.inputs.workspace {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// Per-run inputs, mirroring the action's `with:` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Newline-delimited list of paths, relative to `workspace`
    pub files: Option<String>,

    /// Base directory the paths are relative to
    pub workspace: Option<PathBuf>,

    /// Message for the created commit
    #[serde(rename = "commit-message", alias = "commit_message")]
    pub commit_message: String,

    /// Reference to update; the repository's default branch when unset
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,

    /// Ask git for modified and untracked files instead of using `files`
    #[serde(rename = "detect-changed", alias = "detect_changed")]
    pub detect_changed: bool,

    /// What to do with listed paths that do not exist
    #[serde(rename = "missing-files", alias = "missing_files")]
    pub missing_files: MissingFiles,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            files: None,
            workspace: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            ref_name: None,
            detect_changed: false,
            missing_files: MissingFiles::Permissive,
        }
    }
}

/// Handling of listed paths that are absent from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFiles {
    /// Drop them silently
    #[default]
    Permissive,
    /// Fail the run
    Strict,
}

impl FromStr for MissingFiles {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(MissingFiles::Permissive),
            "strict" => Ok(MissingFiles::Strict),
            other => Err(ConfigError::invalid_value(
                "inputs.missing-files",
                format!("expected 'permissive' or 'strict', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for MissingFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingFiles::Permissive => f.write_str("permissive"),
            MissingFiles::Strict => f.write_str("strict"),
        }
    }
}

/// Remote API settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// REST API base URL
    pub url: String,

    /// Bearer token; never written back out
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 60,
            user_agent: format!("treecommit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Blob upload tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Bytes read from disk per encoder step
    pub chunk_size: usize,

    /// Blob uploads allowed in flight at once
    pub concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            concurrency: 4,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Level or filter directive
    pub log_level: String,

    /// One of `pretty`, `compact`, `json`, `actions`; chosen from the
    /// environment when unset
    pub log_format: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
        }
    }
}
