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

//! Changed-file detection through git
//!
//! Lists tracked files with unstaged modifications plus untracked files that
//! are not ignored. Deleted files are reported too; they drop out later when
//! the blob set finds nothing on disk.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Newline-delimited paths, relative to `workspace`, that git considers changed
pub async fn changed_files(workspace: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["ls-files", "--modified", "--others", "--exclude-standard", "-z"])
        .current_dir(workspace)
        .output()
        .await
        .with_context(|| format!("Failed to run git in {}", workspace.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "git ls-files failed in {} ({}): {}",
            workspace.display(),
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .context("git ls-files returned a path that is not valid UTF-8")?;
    let files = split_nul_list(&stdout);

    debug!(count = files.len(), "Detected changed files");
    Ok(files.join("\n"))
}

/// Entries of a `-z` listing, in order, without repeats
///
/// git repeats unmerged paths once per conflict stage.
fn split_nul_list(listing: &str) -> Vec<&str> {
    let mut files: Vec<&str> = Vec::new();
    for entry in listing.split('\0').filter(|entry| !entry.is_empty()) {
        if !files.contains(&entry) {
            files.push(entry);
        }
    }
    files
}
