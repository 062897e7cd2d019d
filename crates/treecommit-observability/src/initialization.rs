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

//! Logging initialization and setup.
//!
//! Installs the global tracing subscriber for the configured output format.

use crate::actions::WorkflowCommands;
use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Initialize tracing with the specified format and optional log level.
///
/// # Example
///
/// ```ignore
/// use treecommit_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Actions, Some("debug")).unwrap();
/// tracing::info!("Resolving repository");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Initialize tracing with a detailed configuration.
///
/// Fails with [`LogError::ConfigError`] if the level filter does not parse or
/// a global subscriber is already installed.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);

    let installed = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .with_target(config.include_targets)
                .with_ansi(config.use_color)
                .with_span_events(FmtSpan::NONE)
                .pretty();

            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .with_target(config.include_targets)
                .with_ansi(config.use_color)
                .with_span_events(FmtSpan::CLOSE)
                .compact();

            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .json()
                .with_target(config.include_targets)
                .with_current_span(true)
                .with_span_list(false);

            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Actions => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .with_ansi(false)
                .event_format(WorkflowCommands);

            registry.with(layer).try_init()
        }
    };

    installed.map_err(|e| LogError::ConfigError(format!("Failed to install subscriber: {}", e)))
}

/// Get the writer for the specified output
fn get_writer(output: &LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| {
        LogError::ConfigError(format!("Failed to parse log filter '{}': {}", level_str, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installing the global subscriber is a one-shot per process, so only the
    // filter construction is exercised here.

    #[test]
    fn test_env_filter_parsing() {
        let result = build_env_filter(&LogConfig::new().with_level("debug"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_directive_filter_parsing() {
        let result = build_env_filter(
            &LogConfig::new().with_level("info,treecommit_graph=trace,reqwest=warn"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = build_env_filter(&LogConfig::new().with_level("treecommit=notalevel"));
        assert!(result.is_err());
    }
}
