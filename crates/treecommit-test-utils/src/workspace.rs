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

//! Temporary workspaces holding files to commit.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory playing the role of the checked-out workspace.
///
/// # Example
/// ```ignore
/// use treecommit_test_utils::TestWorkspace;
///
/// let workspace = TestWorkspace::new();
/// workspace.write_file("docs/readme.md", b"# Hello\n");
/// let list = TestWorkspace::file_list(&["docs/readme.md", "missing.txt"]);
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a workspace-relative name.
    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a file with the executable bit set.
    #[cfg(unix)]
    pub fn write_executable(&self, name: &str, content: &[u8]) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_file(name, content);
        let mut permissions = fs::metadata(&path)
            .expect("Failed to read metadata")
            .permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("Failed to set permissions");
        path
    }

    /// Create a directory.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.join(name);
        fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    /// Newline-separated file list, the shape the `files` input takes.
    pub fn file_list(names: &[&str]) -> String {
        names.join("\n")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
