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

//! Step outputs
//!
//! Inside a workflow the runner names a file in `GITHUB_OUTPUT`; each output
//! is appended to it as a `name=value` line. Elsewhere the value is printed on
//! stdout so the binary composes in shell pipelines.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output name carrying the new commit id
pub const COMMIT_SHA: &str = "commit-sha";

/// Where step outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Append `name=value` lines to this file
    File(PathBuf),
    /// Print values on stdout
    Stdout,
}

impl OutputSink {
    /// The file named by `GITHUB_OUTPUT`, else stdout
    pub fn from_env() -> Self {
        Self::from_var(std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from))
    }

    fn from_var(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if !path.as_os_str().is_empty() => OutputSink::File(path),
            _ => OutputSink::Stdout,
        }
    }

    /// Publish one output
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        match self {
            OutputSink::File(path) => append_line(path, name, value),
            OutputSink::Stdout => {
                println!("{}", value);
                Ok(())
            }
        }
    }
}

fn append_line(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;

    writeln!(file, "{}={}", name, value)
        .with_context(|| format!("Failed to write output file {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sink_selection() {
        assert_eq!(OutputSink::from_var(None), OutputSink::Stdout);
        assert_eq!(
            OutputSink::from_var(Some(PathBuf::new())),
            OutputSink::Stdout
        );
        assert_eq!(
            OutputSink::from_var(Some(PathBuf::from("/runner/output"))),
            OutputSink::File(PathBuf::from("/runner/output"))
        );
    }

    #[test]
    fn test_file_sink_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        let sink = OutputSink::File(path.clone());
        sink.set_output(COMMIT_SHA, "0123abcd").unwrap();
        sink.set_output("files", "2").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=1\ncommit-sha=0123abcd\nfiles=2\n"
        );
    }

    #[test]
    fn test_file_sink_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh");

        OutputSink::File(path.clone())
            .set_output(COMMIT_SHA, "feed")
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "commit-sha=feed\n");
    }

    #[test]
    fn test_file_sink_reports_unwritable_path() {
        let temp = TempDir::new().unwrap();
        let sink = OutputSink::File(temp.path().join("missing-dir").join("output"));

        let err = sink.set_output(COMMIT_SHA, "feed").unwrap_err();
        assert!(err.to_string().contains("Failed to open output file"));
    }
}
