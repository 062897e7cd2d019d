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

//! Files to commit and their upload
//!
//! A [`BlobSet`] is built from a newline-delimited path list. Each surviving
//! path becomes a [`Blob`] carrying its location on disk, its path inside the
//! repository and its mode. Uploading fills in the id the remote assigned.
//!
//! Nothing is hashed locally: every listed file is uploaded, and the remote
//! deduplicates identical content.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use treecommit_protocol::{FileMode, ObjectStore, RepoSlug, StreamingBlobEncoder, DEFAULT_CHUNK_SIZE};

use crate::error::{GraphError, GraphResult};
use crate::tree::validate_path;

/// Blob uploads in flight when nothing else is configured
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// What to do with listed paths that are not regular files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFilePolicy {
    /// Drop them silently
    #[default]
    Permissive,
    /// Fail on the first one
    Strict,
}

/// Upload tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Bytes read per encoder step
    pub chunk_size: usize,
    /// Blob uploads allowed in flight at once
    pub concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

/// One file to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    absolute_path: PathBuf,
    git_path: String,
    mode: FileMode,
    sha: Option<String>,
}

impl Blob {
    /// Describe a file that has not been uploaded yet
    pub fn new(absolute_path: impl Into<PathBuf>, git_path: impl Into<String>, mode: FileMode) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            git_path: git_path.into(),
            mode,
            sha: None,
        }
    }

    /// Attach the id the remote assigned
    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    /// Location on disk
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Path inside the repository, `/`-separated
    pub fn git_path(&self) -> &str {
        &self.git_path
    }

    /// Tree entry mode
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Remote id, once uploaded
    pub fn sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }

    /// Stream the file to the remote, returning the blob with its id set
    pub async fn upload(
        self,
        store: &dyn ObjectStore,
        repo: &RepoSlug,
        chunk_size: usize,
    ) -> GraphResult<Blob> {
        let encoder = StreamingBlobEncoder::open(&self.absolute_path, chunk_size).await?;
        let file_size = encoder.file_size();

        let created = store.create_blob(repo, encoder.into_body()).await?;
        debug!(
            path = %self.git_path,
            file_size,
            sha = %created.sha,
            "Uploaded blob"
        );

        Ok(self.with_sha(created.sha))
    }
}

/// The ordered set of files one run commits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobSet {
    blobs: Vec<Blob>,
}

impl BlobSet {
    /// Build the set from a newline-delimited path list
    ///
    /// Lines are trimmed and empty lines skipped. Relative lines are taken
    /// from `base_dir`; absolute lines are used as they are. Paths that are
    /// not regular files are dropped or fail according to `policy`. Order is
    /// preserved and a repeated repository path keeps its first occurrence.
    ///
    /// A line that resolves outside `base_dir` fails with
    /// [`GraphError::InvalidTreeEntry`] whatever the policy, before any file is
    /// read.
    pub fn from_paths(list: &str, base_dir: &Path, policy: MissingFilePolicy) -> GraphResult<Self> {
        let mut blobs = Vec::new();
        let mut seen = HashSet::new();

        for line in list.lines().map(str::trim).filter(|line| !line.is_empty()) {
            // The base directory itself is left to the missing-file policy
            let git_path = git_path_for(base_dir, line);
            if !git_path.is_empty() {
                validate_path(&git_path).map_err(|reason| GraphError::InvalidTreeEntry {
                    path: git_path.clone(),
                    reason: reason.to_string(),
                })?;
            }

            let absolute_path = base_dir.join(line);

            let metadata = match fs::metadata(&absolute_path) {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => match policy {
                    MissingFilePolicy::Strict => return Err(GraphError::MissingFile(absolute_path)),
                    MissingFilePolicy::Permissive => {
                        debug!(path = %absolute_path.display(), "Skipping missing file");
                        continue;
                    }
                },
            };

            if !seen.insert(git_path.clone()) {
                debug!(path = %git_path, "Skipping duplicate path");
                continue;
            }

            blobs.push(Blob::new(absolute_path, git_path, mode_of(&metadata)));
        }

        Ok(Self { blobs })
    }

    /// Wrap already described blobs
    pub fn from_blobs(blobs: Vec<Blob>) -> Self {
        Self { blobs }
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether there is nothing to commit
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// The files, in list order
    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    /// Iterate over the files
    pub fn iter(&self) -> std::slice::Iter<'_, Blob> {
        self.blobs.iter()
    }

    /// Upload every blob, at most `options.concurrency` at a time
    ///
    /// Results keep list order. The first failure aborts the uploads still
    /// running and is returned.
    pub async fn upload(
        self,
        store: Arc<dyn ObjectStore>,
        repo: &RepoSlug,
        options: UploadOptions,
    ) -> GraphResult<BlobSet> {
        let total = self.blobs.len();
        let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
        let mut tasks = Vec::with_capacity(total);

        for blob in self.blobs {
            let store = Arc::clone(&store);
            let repo = repo.clone();
            let semaphore = Arc::clone(&semaphore);
            let chunk_size = options.chunk_size;

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| GraphError::TaskFailed(e.to_string()))?;
                blob.upload(store.as_ref(), &repo, chunk_size).await
            }));
        }

        let mut uploaded = Vec::with_capacity(total);
        let mut tasks = tasks.into_iter();
        while let Some(task) = tasks.next() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(GraphError::TaskFailed(e.to_string())),
            };

            match result {
                Ok(blob) => uploaded.push(blob),
                Err(err) => {
                    for rest in tasks {
                        rest.abort();
                    }
                    return Err(err);
                }
            }
        }

        info!(count = total, concurrency = options.concurrency, "Uploaded blobs");
        Ok(BlobSet { blobs: uploaded })
    }
}

impl IntoIterator for BlobSet {
    type Item = Blob;
    type IntoIter = std::vec::IntoIter<Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.into_iter()
    }
}

impl<'a> IntoIterator for &'a BlobSet {
    type Item = &'a Blob;
    type IntoIter = std::slice::Iter<'a, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

/// Repository path of a listed line, resolved lexically against `base_dir`
///
/// `.` segments are dropped and `..` cancels the previous segment. A path
/// that climbs above the base keeps its leading `..`; an absolute path outside
/// the base stays absolute. [`BlobSet::from_paths`] refuses both.
pub fn git_path_for(base_dir: &Path, line: &str) -> String {
    let line_path = Path::new(line);

    let relative = if line_path.is_absolute() {
        let base = normalize(base_dir);
        let target = normalize(line_path);
        match target.strip_prefix(&base) {
            Ok(inside) => inside.to_path_buf(),
            Err(_) => return slash_separated(&target),
        }
    } else {
        line_path.to_path_buf()
    };

    slash_separated(&normalize(&relative))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn slash_separated(path: &Path) -> String {
    let mut parts = Vec::new();
    let mut absolute = false;
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => absolute = true,
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> FileMode {
    use std::os::unix::fs::PermissionsExt;

    if metadata.permissions().mode() & 0o111 != 0 {
        FileMode::Executable
    } else {
        FileMode::Regular
    }
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata) -> FileMode {
    FileMode::Regular
}
