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

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// YAML document
    Yaml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
///
/// Sources are layered lowest to highest: built-in defaults, an optional
/// file, then environment inputs. Command-line flags are applied by the
/// binary after loading.
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let format = ConfigFormat::from_path(path)?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        debug!("Configuration loaded from {}", format.name());

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load defaults (or `path`, when given) and overlay the process environment
    pub async fn load_with_overrides(&self, path: Option<&Path>) -> ConfigResult<Config> {
        let mut config = match path {
            Some(path) => self.load_file(path).await?,
            None => Config::default(),
        };
        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides_from(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// Follows the GitHub Actions conventions: inputs arrive as `INPUT_<NAME>`
    /// with the input's own hyphens preserved, and an empty value means the
    /// input was not supplied.
    pub fn apply_overrides_from<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |names: &[&str]| -> Option<(String, String)> {
            names.iter().find_map(|name| {
                lookup(name)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (name.to_string(), value))
            })
        };

        if let Some((_, value)) = get(&["INPUT_REPOSITORY", "GITHUB_REPOSITORY"]) {
            config.repository = Some(value.trim().to_string());
        }

        // API settings
        if let Some((_, value)) = get(&["INPUT_API-URL", "GITHUB_API_URL"]) {
            config.api.url = value.trim().trim_end_matches('/').to_string();
        }
        if let Some((_, value)) = get(&["INPUT_TOKEN", "GITHUB_TOKEN"]) {
            config.api.token = Some(value.trim().to_string());
        }

        // Run inputs
        if let Some((_, value)) = get(&["INPUT_FILES"]) {
            config.inputs.files = Some(value);
        }
        if let Some((_, value)) = get(&["INPUT_WORKSPACE", "GITHUB_WORKSPACE"]) {
            config.inputs.workspace = Some(PathBuf::from(value.trim()));
        }
        if let Some((_, value)) = get(&["INPUT_COMMIT-MESSAGE", "INPUT_COMMIT_MESSAGE"]) {
            config.inputs.commit_message = value;
        }
        if let Some((_, value)) = get(&["INPUT_REF"]) {
            config.inputs.ref_name = Some(value.trim().to_string());
        }
        if let Some((name, value)) = get(&["INPUT_DETECT-CHANGED", "INPUT_DETECT_CHANGED"]) {
            config.inputs.detect_changed = parse_input_bool(&name, &value)?;
        }
        if let Some((_, value)) = get(&["INPUT_MISSING-FILES", "INPUT_MISSING_FILES"]) {
            config.inputs.missing_files = value.parse()?;
        }

        // Upload settings
        if let Some((name, value)) = get(&["INPUT_UPLOAD-CONCURRENCY", "TREECOMMIT_UPLOAD_CONCURRENCY"]) {
            config.upload.concurrency = value.trim().parse().map_err(|_| {
                ConfigError::env_var_parsing_error(name, &value, "expected a positive integer")
            })?;
        }
        if let Some((name, value)) = get(&["INPUT_CHUNK-SIZE", "TREECOMMIT_CHUNK_SIZE"]) {
            config.upload.chunk_size = value.trim().parse().map_err(|_| {
                ConfigError::env_var_parsing_error(name, &value, "expected a size in bytes")
            })?;
        }

        // Observability settings
        if let Some((_, value)) = get(&["TREECOMMIT_LOG_LEVEL"]) {
            config.observability.log_level = value.trim().to_string();
        }
        if let Some((_, value)) = get(&["TREECOMMIT_LOG_FORMAT"]) {
            config.observability.log_format = Some(value.trim().to_string());
        } else if config.observability.log_format.is_none()
            && lookup("GITHUB_ACTIONS").as_deref() == Some("true")
        {
            config.observability.log_format = Some("actions".to_string());
        }

        if self.validate {
            config.validate()?;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a boolean input the way the Actions toolkit does: only the YAML 1.2
/// core-schema spellings are accepted.
pub fn parse_input_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            name,
            value,
            "expected one of: true | True | TRUE | false | False | FALSE",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::MissingFiles;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn apply(pairs: &[(&str, &str)]) -> ConfigResult<Config> {
        let vars = env(pairs);
        let mut config = Config::default();
        ConfigLoader::new().apply_overrides_from(&mut config, |name| vars.get(name).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("treecommit.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("treecommit.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("treecommit.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("treecommit.json").unwrap(), ConfigFormat::Json);
    }

    #[test]
    fn test_format_detection_error() {
        assert!(ConfigFormat::from_path("treecommit.xml").is_err());
        assert!(ConfigFormat::from_path("treecommit").is_err());
    }

    #[test]
    fn test_parse_input_bool() {
        assert!(parse_input_bool("X", "true").unwrap());
        assert!(parse_input_bool("X", "True").unwrap());
        assert!(parse_input_bool("X", "TRUE").unwrap());
        assert!(!parse_input_bool("X", "false").unwrap());
        assert!(!parse_input_bool("X", "FALSE").unwrap());
        assert!(parse_input_bool("X", "yes").is_err());
        assert!(parse_input_bool("X", "1").is_err());
    }

    #[test]
    fn test_action_inputs() {
        let config = apply(&[
            ("GITHUB_REPOSITORY", "octo/hello"),
            ("GITHUB_WORKSPACE", "/home/runner/work/hello"),
            ("INPUT_FILES", "a.txt\nb/c.txt\n"),
            ("INPUT_COMMIT-MESSAGE", "chore: regenerate"),
            ("INPUT_REF", "release"),
            ("INPUT_DETECT-CHANGED", "false"),
            ("INPUT_MISSING-FILES", "strict"),
            ("GITHUB_TOKEN", "ghs_abc"),
        ])
        .unwrap();

        assert_eq!(config.repository.as_deref(), Some("octo/hello"));
        assert_eq!(
            config.inputs.workspace,
            Some(PathBuf::from("/home/runner/work/hello"))
        );
        assert_eq!(config.inputs.files.as_deref(), Some("a.txt\nb/c.txt\n"));
        assert_eq!(config.inputs.commit_message, "chore: regenerate");
        assert_eq!(config.inputs.ref_name.as_deref(), Some("release"));
        assert!(!config.inputs.detect_changed);
        assert_eq!(config.inputs.missing_files, MissingFiles::Strict);
        assert_eq!(config.api.token.as_deref(), Some("ghs_abc"));
    }

    #[test]
    fn test_empty_inputs_are_unset() {
        let config = apply(&[("INPUT_REF", ""), ("INPUT_FILES", "  "), ("INPUT_COMMIT-MESSAGE", "")])
            .unwrap();
        assert!(config.inputs.ref_name.is_none());
        assert!(config.inputs.files.is_none());
        assert_eq!(
            config.inputs.commit_message,
            crate::schema::DEFAULT_COMMIT_MESSAGE
        );
    }

    #[test]
    fn test_explicit_inputs_win_over_runner_variables() {
        let config = apply(&[
            ("GITHUB_WORKSPACE", "/runner"),
            ("INPUT_WORKSPACE", "/custom"),
            ("GITHUB_TOKEN", "runner-token"),
            ("INPUT_TOKEN", "input-token"),
        ])
        .unwrap();
        assert_eq!(config.inputs.workspace, Some(PathBuf::from("/custom")));
        assert_eq!(config.api.token.as_deref(), Some("input-token"));
    }

    #[test]
    fn test_invalid_boolean_input() {
        let err = apply(&[("INPUT_DETECT-CHANGED", "yes")]).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParsingError { .. }));
    }

    #[test]
    fn test_actions_runner_selects_actions_log_format() {
        let config = apply(&[("GITHUB_ACTIONS", "true")]).unwrap();
        assert_eq!(config.observability.log_format.as_deref(), Some("actions"));

        let config = apply(&[("GITHUB_ACTIONS", "true"), ("TREECOMMIT_LOG_FORMAT", "json")]).unwrap();
        assert_eq!(config.observability.log_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_upload_overrides() {
        let config = apply(&[
            ("INPUT_UPLOAD-CONCURRENCY", "8"),
            ("INPUT_CHUNK-SIZE", "3072"),
        ])
        .unwrap();
        assert_eq!(config.upload.concurrency, 8);
        assert_eq!(config.upload.chunk_size, 3072);

        assert!(apply(&[("INPUT_UPLOAD-CONCURRENCY", "many")]).is_err());
        assert!(apply(&[("INPUT_UPLOAD-CONCURRENCY", "0")]).is_err());
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let config = apply(&[("GITHUB_API_URL", "https://ghe.example.com/api/v3/")]).unwrap();
        assert_eq!(config.api.url, "https://ghe.example.com/api/v3");
    }
}
