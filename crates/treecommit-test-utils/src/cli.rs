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

//! CLI test helpers.
//!
//! Provides utilities for running the treecommit binary in tests.

use assert_cmd::Command;
use std::path::Path;

/// Environment variables that would leak the host's CI context into a test run.
const AMBIENT_VARS: &[&str] = &[
    "GITHUB_ACTIONS",
    "GITHUB_API_URL",
    "GITHUB_OUTPUT",
    "GITHUB_REPOSITORY",
    "GITHUB_TOKEN",
    "GITHUB_WORKSPACE",
    "INPUT_API-URL",
    "INPUT_CHUNK-SIZE",
    "INPUT_COMMIT-MESSAGE",
    "INPUT_COMMIT_MESSAGE",
    "INPUT_DETECT-CHANGED",
    "INPUT_DETECT_CHANGED",
    "INPUT_FILES",
    "INPUT_MISSING-FILES",
    "INPUT_MISSING_FILES",
    "INPUT_REF",
    "INPUT_REPOSITORY",
    "INPUT_TOKEN",
    "INPUT_UPLOAD-CONCURRENCY",
    "INPUT_WORKSPACE",
    "RUST_LOG",
    "TREECOMMIT_CHUNK_SIZE",
    "TREECOMMIT_CONFIG",
    "TREECOMMIT_LOG_FORMAT",
    "TREECOMMIT_LOG_LEVEL",
    "TREECOMMIT_UPLOAD_CONCURRENCY",
];

/// Get a Command for the treecommit binary with CI variables cleared.
///
/// # Example
/// ```ignore
/// use treecommit_test_utils::treecommit;
///
/// treecommit()
///     .arg("--help")
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn treecommit() -> Command {
    let mut cmd = Command::cargo_bin("treecommit").expect("treecommit binary not found");
    for var in AMBIENT_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Run treecommit in `dir` against `repository`, with no other inputs.
pub fn treecommit_in(dir: &Path, repository: &str) -> Command {
    let mut cmd = treecommit();
    cmd.current_dir(dir)
        .env("GITHUB_REPOSITORY", repository)
        .env("GITHUB_WORKSPACE", dir);
    cmd
}
