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

//! Command-line arguments
//!
//! Every flag is optional; a flag that is given wins over the configuration
//! file and the `INPUT_*` / `GITHUB_*` environment.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use treecommit_config::{Config, MissingFiles};

/// Commit files from a local workspace to a GitHub branch
#[derive(Parser, Debug)]
#[command(name = "treecommit")]
#[command(version, about = "Commit workspace files to a GitHub reference through the Git data API")]
#[command(after_help = "EXAMPLES:
    # Commit two files onto the default branch
    treecommit -R octo/hello --files 'README.md
    docs/guide.md'

    # Commit whatever git reports as changed, onto a release branch
    treecommit -R octo/hello --detect-changed --ref release/1.x -m 'Regenerate docs'

ENVIRONMENT:
    GITHUB_REPOSITORY, GITHUB_WORKSPACE, GITHUB_API_URL, GITHUB_TOKEN and the
    action inputs INPUT_FILES, INPUT_REF, INPUT_COMMIT-MESSAGE,
    INPUT_DETECT-CHANGED are read when the matching flag is absent.")]
pub struct Cli {
    /// Paths to commit, in addition to --files
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, value_name = "FILE", env = "TREECOMMIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target repository as owner/name
    #[arg(short = 'R', long, value_name = "OWNER/NAME")]
    pub repository: Option<String>,

    /// Newline-delimited list of paths relative to the workspace
    #[arg(long, value_name = "LIST")]
    pub files: Option<String>,

    /// Directory the paths are relative to
    #[arg(short = 'C', long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Commit message
    #[arg(short, long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Reference to update (defaults to the repository's default branch)
    #[arg(long = "ref", value_name = "REF")]
    pub ref_name: Option<String>,

    /// Commit the files git reports as modified or untracked
    #[arg(long)]
    pub detect_changed: bool,

    /// What to do with listed paths that do not exist
    #[arg(long, value_enum, value_name = "POLICY")]
    pub missing_files: Option<MissingFilesArg>,

    /// REST API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Blob uploads allowed in flight at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Bytes read from disk per encoder step
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Log level or filter directive
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json, actions)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// `--missing-files` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingFilesArg {
    /// Drop paths that are not files
    Permissive,
    /// Fail on the first path that is not a file
    Strict,
}

impl From<MissingFilesArg> for MissingFiles {
    fn from(arg: MissingFilesArg) -> Self {
        match arg {
            MissingFilesArg::Permissive => MissingFiles::Permissive,
            MissingFilesArg::Strict => MissingFiles::Strict,
        }
    }
}

impl Cli {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(repository) = &self.repository {
            config.repository = Some(repository.trim().to_string());
        }

        if let Some(files) = self.file_list() {
            config.inputs.files = Some(files);
        }
        if let Some(workspace) = &self.workspace {
            config.inputs.workspace = Some(workspace.clone());
        }
        if let Some(message) = &self.message {
            config.inputs.commit_message = message.clone();
        }
        if let Some(ref_name) = &self.ref_name {
            config.inputs.ref_name = Some(ref_name.trim().to_string());
        }
        if self.detect_changed {
            config.inputs.detect_changed = true;
        }
        if let Some(policy) = self.missing_files {
            config.inputs.missing_files = policy.into();
        }

        if let Some(url) = &self.api_url {
            config.api.url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(concurrency) = self.concurrency {
            config.upload.concurrency = concurrency;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.upload.chunk_size = chunk_size;
        }

        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        } else if self.verbose {
            config.observability.log_level = "debug".to_string();
        } else if self.quiet {
            config.observability.log_level = "error".to_string();
        }
        if let Some(format) = &self.log_format {
            config.observability.log_format = Some(format.clone());
        }
    }

    /// `--files` followed by positional paths, one per line
    fn file_list(&self) -> Option<String> {
        let mut lines: Vec<&str> = Vec::new();
        if let Some(files) = &self.files {
            lines.push(files);
        }
        lines.extend(self.paths.iter().map(String::as_str));

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
