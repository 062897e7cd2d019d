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

//! Reference resolution and fast-forward updates
//!
//! A [`ReferenceHandle`] names a reference; loading it yields a
//! [`ResolvedReference`] holding the commit it pointed at and that commit's
//! root tree. Only a resolved reference can be updated, and only by
//! fast-forward.

use tracing::{debug, info, warn};
use treecommit_protocol::{ObjectStore, ProtocolError, RefUpdateOutcome, RepoSlug, UpdateRefRequest};

use crate::error::{GraphError, GraphResult};

/// Normalize a reference name to the `heads/...` or `tags/...` form the API uses
///
/// # Examples
///
/// ```
/// use treecommit_graph::normalize_ref_name;
///
/// assert_eq!(normalize_ref_name("main"), "heads/main");
/// assert_eq!(normalize_ref_name("refs/heads/main"), "heads/main");
/// assert_eq!(normalize_ref_name("refs/tags/v1"), "tags/v1");
/// assert_eq!(normalize_ref_name("heads/feature/auth"), "heads/feature/auth");
/// ```
pub fn normalize_ref_name(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(stripped) = trimmed.strip_prefix("refs/") {
        stripped.to_string()
    } else if trimmed.starts_with("heads/") || trimmed.starts_with("tags/") {
        trimmed.to_string()
    } else {
        format!("heads/{}", trimmed)
    }
}

/// An unresolved reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHandle {
    repo: RepoSlug,
    name: String,
}

impl ReferenceHandle {
    /// Name a reference of `repo`; the name is normalized
    pub fn new(repo: RepoSlug, name: &str) -> Self {
        Self {
            repo,
            name: normalize_ref_name(name),
        }
    }

    /// Normalized name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the reference to its commit and root tree
    ///
    /// # Errors
    ///
    /// [`GraphError::RefNotFound`] when the reference does not exist.
    pub async fn load(self, store: &dyn ObjectStore) -> GraphResult<ResolvedReference> {
        debug!(reference = %self.name, "Resolving reference");

        let info = store
            .get_reference(&self.repo, &self.name)
            .await
            .map_err(|err| match err {
                ProtocolError::NotFound { .. } => GraphError::RefNotFound(self.name.clone()),
                other => GraphError::from(other),
            })?;

        info!(
            reference = %self.name,
            commit = %info.commit_sha,
            tree = %info.tree_sha,
            "Resolved reference"
        );

        Ok(ResolvedReference {
            repo: self.repo,
            name: self.name,
            commit_sha: info.commit_sha,
            tree_sha: info.tree_sha,
        })
    }
}

/// A reference with its commit and root tree as read from the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    repo: RepoSlug,
    name: String,
    commit_sha: String,
    tree_sha: String,
}

impl ResolvedReference {
    /// Normalized name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commit the reference pointed at when loaded
    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    /// Root tree of that commit
    pub fn tree_sha(&self) -> &str {
        &self.tree_sha
    }

    /// Ask the remote to fast-forward the reference to `new_commit`
    ///
    /// A refusal is returned as [`RefUpdateOutcome::Rejected`], not as an error.
    pub async fn try_update(
        &self,
        store: &dyn ObjectStore,
        new_commit: &str,
    ) -> GraphResult<RefUpdateOutcome> {
        debug!(reference = %self.name, from = %self.commit_sha, to = %new_commit, "Updating reference");

        let outcome = store
            .update_reference(&self.repo, &self.name, &UpdateRefRequest::fast_forward(new_commit))
            .await?;

        match &outcome {
            RefUpdateOutcome::Updated { sha } => {
                info!(reference = %self.name, sha = %sha, "Updated reference")
            }
            RefUpdateOutcome::Rejected { reason } => {
                warn!(reference = %self.name, reason = %reason, "Reference update rejected")
            }
        }

        Ok(outcome)
    }

    /// Fast-forward the reference to `new_commit`, returning the new target
    ///
    /// # Errors
    ///
    /// [`GraphError::NonFastForward`] when the remote refuses the move; the
    /// reference is left unchanged and the update is not retried.
    pub async fn update(&self, store: &dyn ObjectStore, new_commit: &str) -> GraphResult<String> {
        match self.try_update(store, new_commit).await? {
            RefUpdateOutcome::Updated { sha } => Ok(sha),
            RefUpdateOutcome::Rejected { reason } => Err(GraphError::NonFastForward {
                reference: self.name.clone(),
                reason,
            }),
        }
    }
}
