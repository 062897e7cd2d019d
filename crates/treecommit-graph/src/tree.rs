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

//! Tree construction
//!
//! Trees are requested as a base tree plus the uploaded blobs; the remote
//! keeps every path the request does not mention. No local tree walking is
//! needed.

use std::collections::BTreeMap;
use tracing::{debug, info};
use treecommit_protocol::{CreateTreeRequest, ObjectStore, RepoSlug, TreeEntry};

use crate::blob::{Blob, BlobSet};
use crate::error::{GraphError, GraphResult};

/// Builds a tree request layered over a base tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeBuilder {
    base_tree: String,
    entries: BTreeMap<String, TreeEntry>,
}

impl TreeBuilder {
    /// Start a tree over `base_tree` with no entries
    pub fn new(base_tree: impl Into<String>) -> Self {
        Self {
            base_tree: base_tree.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Start a tree over `base_tree` holding every blob of `blobs`
    pub fn from_blobs(base_tree: impl Into<String>, blobs: &BlobSet) -> GraphResult<Self> {
        let mut builder = Self::new(base_tree);
        for blob in blobs {
            builder.add_blob(blob)?;
        }
        Ok(builder)
    }

    /// Add an uploaded blob
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidTreeEntry`] when the blob has no id, its path is
    /// empty, absolute or climbs out of the repository, or the path is
    /// already present.
    pub fn add_blob(&mut self, blob: &Blob) -> GraphResult<&mut Self> {
        let path = blob.git_path();
        let invalid = |reason: &str| GraphError::InvalidTreeEntry {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let sha = blob.sha().ok_or_else(|| invalid("blob has not been uploaded"))?;
        validate_path(path).map_err(invalid)?;
        if self.entries.contains_key(path) {
            return Err(invalid("path appears more than once"));
        }

        self.entries
            .insert(path.to_string(), TreeEntry::blob(path, blob.mode(), sha));
        Ok(self)
    }

    /// Tree the entries are layered over
    pub fn base_tree(&self) -> &str {
        &self.base_tree
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The request document, entries sorted by path
    pub fn request(&self) -> CreateTreeRequest {
        CreateTreeRequest {
            base_tree: self.base_tree.clone(),
            tree: self.entries.values().cloned().collect(),
        }
    }

    /// Create the tree remotely, returning its id
    pub async fn save(&self, store: &dyn ObjectStore, repo: &RepoSlug) -> GraphResult<String> {
        debug!(base_tree = %self.base_tree, entries = self.entries.len(), "Creating tree");

        let created = store.create_tree(repo, &self.request()).await?;

        info!(sha = %created.sha, entries = self.entries.len(), "Created tree");
        Ok(created.sha)
    }
}

/// Why `path` cannot name a tree entry, if it cannot
pub(crate) fn validate_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("path is empty");
    }
    if path.starts_with('/') {
        return Err("path is absolute");
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err("path escapes the repository root");
    }
    if path.split('/').any(|segment| segment.is_empty() || segment == ".") {
        return Err("path is not normalized");
    }
    Ok(())
}
