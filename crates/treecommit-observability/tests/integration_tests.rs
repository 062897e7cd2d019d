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

//! Integration tests for logging configuration
//!
//! Only configuration building is covered: the global subscriber can be
//! installed once per process, so initialization is left to the binary.

use treecommit_observability::{LogConfig, LogFormat, LogOutput};

#[test]
fn test_config_builder_chaining() {
    let config = LogConfig::new()
        .with_format(LogFormat::Actions)
        .with_level("debug")
        .with_timestamps(false)
        .with_color(false)
        .with_targets(false)
        .with_output(LogOutput::Stdout);

    assert_eq!(config.format, LogFormat::Actions);
    assert_eq!(config.level, Some("debug".to_string()));
    assert!(!config.use_timestamps);
    assert!(!config.use_color);
    assert!(!config.include_targets);
    assert_eq!(config.output, LogOutput::Stdout);
}

#[test]
fn test_default_config() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.output, LogOutput::Stderr);
    assert!(config.use_color);
    assert!(config.use_timestamps);
    assert!(config.level.is_none());
}

#[test]
fn test_explicit_level_overrides_env() {
    let config = LogConfig::new()
        .with_format(LogFormat::Compact)
        .with_level("warn");
    assert_eq!(config.get_effective_level(), "warn");
}

#[test]
fn test_unknown_format_is_rejected() {
    let err = "xml".parse::<LogFormat>().unwrap_err();
    assert!(err.to_string().contains("xml"));
}
