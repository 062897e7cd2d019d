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
use crate::schema::{ApiConfig, Config, InputsConfig, ObservabilityConfig, UploadConfig};

/// Largest accepted encoder chunk
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Largest accepted upload worker count
pub const MAX_CONCURRENCY: usize = 64;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 5] = ["pretty", "compact", "json", "actions", "github"];

/// Validation trait for configuration sections
pub trait Validator {
    /// Check the section, returning the first problem found
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(repository) = &self.repository {
            validate_repository(repository)?;
        }
        self.inputs.validate()?;
        self.api.validate()?;
        self.upload.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for InputsConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.commit_message.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "inputs.commit-message".to_string(),
            ));
        }

        if let Some(ref_name) = &self.ref_name {
            if ref_name.trim().is_empty() || ref_name.contains("..") || ref_name.ends_with('/') {
                return Err(ConfigError::invalid_value(
                    "inputs.ref",
                    format!("'{}' is not a valid reference name", ref_name),
                ));
            }
        }

        Ok(())
    }
}

impl Validator for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(ConfigError::invalid_value(
                "api.url",
                format!("must be an http(s) URL, got '{}'", self.url),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "api.timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingRequired("api.user_agent".to_string()));
        }

        Ok(())
    }
}

impl Validator for UploadConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::invalid_value(
                "upload.chunk_size",
                format!(
                    "must be between 1 and {} bytes, got {}",
                    MAX_CHUNK_SIZE, self.chunk_size
                ),
            ));
        }

        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::invalid_value(
                "upload.concurrency",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_CONCURRENCY, self.concurrency
                ),
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        // Filter directives such as "info,treecommit_graph=trace" are passed
        // through to the subscriber, which reports its own parse errors.
        let level = self.log_level.to_lowercase();
        if !level.contains('=') && !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            ));
        }

        if let Some(format) = &self.log_format {
            if !VALID_LOG_FORMATS.contains(&format.to_lowercase().as_str()) {
                return Err(ConfigError::invalid_value(
                    "observability.log_format",
                    format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
                ));
            }
        }

        Ok(())
    }
}

/// Check an `owner/name` repository identity
pub fn validate_repository(repository: &str) -> ConfigResult<()> {
    let mut parts = repository.split('/');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => {
            !owner.trim().is_empty() && !name.trim().is_empty()
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            "repository",
            format!("expected 'owner/name', got '{}'", repository),
        ))
    }
}
