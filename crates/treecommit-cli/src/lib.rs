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

//! treecommit command-line front end
//!
//! Gathers inputs from flags, an optional configuration file and the
//! workflow environment, then hands them to [`treecommit_graph::CommitPipeline`]
//! backed by the GitHub REST client. The new commit id is published through
//! [`output::OutputSink`] once the reference has moved.

pub mod args;
pub mod changed;
pub mod output;

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use treecommit_config::{Config, ConfigLoader, MissingFiles, Validator};
use treecommit_graph::{CommitPipeline, CommitRequest, MissingFilePolicy, Outcome, UploadOptions};
use treecommit_observability::{LogConfig, LogFormat, LogOutput};
use treecommit_protocol::{ClientOptions, GitHubClient};

pub use args::Cli;
pub use output::{OutputSink, COMMIT_SHA};

/// Resolve the effective configuration: file (if any), then environment,
/// then flags
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let loader = ConfigLoader::without_validation();
    let mut config = loader
        .load_with_overrides(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Logging setup for `config`
///
/// `RUST_LOG` takes over when the level was left at its default.
pub fn log_config(config: &Config) -> Result<LogConfig> {
    let format = match config.observability.log_format.as_deref() {
        Some(name) => name
            .parse::<LogFormat>()
            .context("Invalid log format")?,
        None => LogFormat::Pretty,
    };

    let mut log = LogConfig::new()
        .with_format(format)
        .with_color(std::io::stderr().is_terminal())
        .with_targets(false);

    if format == LogFormat::Actions {
        log = log.with_output(LogOutput::Stdout).with_timestamps(false);
    }

    let level = config.observability.log_level.trim();
    if level != "info" || std::env::var_os("RUST_LOG").is_none() {
        log = log.with_level(level);
    }

    Ok(log)
}

/// Run one commit with `config`, publishing the commit id to `sink`
pub async fn execute(config: &Config, sink: &OutputSink) -> Result<Outcome> {
    let repository = config.require_repository()?.to_string();
    let base_dir = config
        .workspace_dir()
        .context("Failed to determine the workspace directory")?;

    let files = if config.inputs.detect_changed {
        changed::changed_files(&base_dir).await?
    } else {
        config.inputs.files.clone().unwrap_or_default()
    };

    let client = GitHubClient::new(ClientOptions {
        api_url: config.api.url.clone(),
        token: config.api.token.clone(),
        user_agent: config.api.user_agent.clone(),
        timeout: Duration::from_secs(config.api.timeout_secs),
    })
    .context("Failed to create the API client")?;
    debug!(api = %config.api.url, authenticated = config.api.token.is_some(), "API client ready");

    let request = CommitRequest {
        repository,
        ref_name: config.inputs.ref_name.clone(),
        files,
        base_dir,
        message: config.inputs.commit_message.clone(),
        missing_files: policy(config.inputs.missing_files),
        upload: UploadOptions {
            chunk_size: config.upload.chunk_size,
            concurrency: config.upload.concurrency,
        },
    };

    let outcome = CommitPipeline::new(Arc::new(client)).run(request).await?;

    match &outcome {
        Outcome::Committed {
            commit_sha,
            reference,
            ..
        } => {
            sink.set_output(COMMIT_SHA, commit_sha)?;
            info!(commit = %commit_sha, reference = %reference, "Reference updated");
        }
        Outcome::NoChanges { reference } => {
            info!(reference = %reference, "Reference left unchanged");
        }
        Outcome::NoFiles => {}
    }

    Ok(outcome)
}

fn policy(missing_files: MissingFiles) -> MissingFilePolicy {
    match missing_files {
        MissingFiles::Permissive => MissingFilePolicy::Permissive,
        MissingFiles::Strict => MissingFilePolicy::Strict,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_format_logs_to_stdout() {
        let mut config = Config::default();
        config.observability.log_format = Some("actions".to_string());

        let log = log_config(&config).unwrap();
        assert_eq!(log.format, LogFormat::Actions);
        assert_eq!(log.output, LogOutput::Stdout);
        assert!(!log.use_timestamps);
    }

    #[test]
    fn test_default_format_logs_to_stderr() {
        let mut config = Config::default();
        config.observability.log_level = "debug".to_string();

        let log = log_config(&config).unwrap();
        assert_eq!(log.format, LogFormat::Pretty);
        assert_eq!(log.output, LogOutput::Stderr);
        assert_eq!(log.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.observability.log_format = Some("xml".to_string());
        assert!(log_config(&config).is_err());
    }

    #[test]
    fn test_policy_mapping() {
        assert_eq!(policy(MissingFiles::Strict), MissingFilePolicy::Strict);
        assert_eq!(policy(MissingFiles::Permissive), MissingFilePolicy::Permissive);
    }
}
