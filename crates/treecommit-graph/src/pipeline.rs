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

//! End-to-end commit of local files onto a remote reference
//!
//! Stages run strictly in order:
//!
//! 1. resolve the repository (and its default branch)
//! 2. resolve the reference to its commit and root tree
//! 3. collect the listed files
//! 4. upload blobs, bounded by the configured concurrency
//! 5. create a tree over the reference's tree, then a commit on top of the
//!    reference's commit
//! 6. fast-forward the reference to the new commit
//!
//! The commit id is reported only once the reference points at it. A failure
//! at any stage ends the run; objects already created are left behind.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use treecommit_protocol::ObjectStore;

use crate::blob::{BlobSet, MissingFilePolicy, UploadOptions};
use crate::commit::CommitBuilder;
use crate::error::GraphResult;
use crate::reference::ReferenceHandle;
use crate::repository::RepositoryHandle;
use crate::tree::TreeBuilder;

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Repository identity, `owner/name`
    pub repository: String,
    /// Reference to commit onto; the default branch when unset
    pub ref_name: Option<String>,
    /// Newline-delimited paths to commit
    pub files: String,
    /// Directory relative paths are taken from
    pub base_dir: PathBuf,
    /// Commit message
    pub message: String,
    /// Handling of listed paths that are not files
    pub missing_files: MissingFilePolicy,
    /// Upload tuning
    pub upload: UploadOptions,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file list was empty; nothing was contacted
    NoFiles,
    /// None of the listed paths was a file; nothing was written
    NoChanges {
        /// Reference that was left as it was
        reference: String,
    },
    /// A commit was created and the reference moved to it
    Committed {
        /// New commit id
        commit_sha: String,
        /// Its root tree
        tree_sha: String,
        /// Reference now pointing at it
        reference: String,
        /// Number of files committed
        files: usize,
    },
}

impl Outcome {
    /// The new commit id, if one was created
    pub fn commit_sha(&self) -> Option<&str> {
        match self {
            Outcome::Committed { commit_sha, .. } => Some(commit_sha),
            _ => None,
        }
    }
}

/// Runs the blob, tree, commit and reference stages against a store
#[derive(Debug, Clone)]
pub struct CommitPipeline {
    store: Arc<dyn ObjectStore>,
}

impl CommitPipeline {
    /// Pipeline over `store`
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Commit the requested files
    #[instrument(skip(self, request), fields(repository = %request.repository))]
    pub async fn run(&self, request: CommitRequest) -> GraphResult<Outcome> {
        if request.files.trim().is_empty() {
            info!("Files to be committed are not specified.");
            return Ok(Outcome::NoFiles);
        }

        let store = self.store.as_ref();

        let mut repository = RepositoryHandle::new(&request.repository)?;
        let info = repository.load(store).await?;
        let ref_name = match request.ref_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => info.default_branch.clone(),
        };

        let reference = ReferenceHandle::new(repository.slug().clone(), &ref_name)
            .load(store)
            .await?;

        let blobs = BlobSet::from_paths(&request.files, &request.base_dir, request.missing_files)?;
        if blobs.is_empty() {
            info!(reference = %reference.name(), "None of the listed paths exist; nothing to commit");
            return Ok(Outcome::NoChanges {
                reference: reference.name().to_string(),
            });
        }

        info!(count = blobs.len(), reference = %reference.name(), "Committing files");

        let blobs = blobs
            .upload(Arc::clone(&self.store), repository.slug(), request.upload)
            .await?;

        let tree_sha = TreeBuilder::from_blobs(reference.tree_sha(), &blobs)?
            .save(store, repository.slug())
            .await?;

        let commit = CommitBuilder::new(
            tree_sha.clone(),
            request.message,
            vec![reference.commit_sha().to_string()],
        )
        .save(store, repository.slug())
        .await?;

        reference.update(store, &commit.sha).await?;

        info!(
            commit = %commit.sha,
            reference = %reference.name(),
            files = blobs.len(),
            "Committed"
        );

        Ok(Outcome::Committed {
            commit_sha: commit.sha,
            tree_sha,
            reference: reference.name().to_string(),
            files: blobs.len(),
        })
    }
}
