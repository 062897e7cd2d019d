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

//! Commit creation

use tracing::{debug, info};
use treecommit_protocol::{CreateCommitRequest, ObjectStore, RepoSlug};

use crate::error::{GraphError, GraphResult};

/// A commit the remote has stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCommit {
    /// Commit id
    pub sha: String,
    /// Root tree id
    pub tree: String,
    /// Parent commit ids
    pub parents: Vec<String>,
}

/// Builds and creates a commit
///
/// Saving is not idempotent: every [`save`](CommitBuilder::save) creates a
/// new commit, and objects from an abandoned run are left for the remote to
/// collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBuilder {
    tree: String,
    message: String,
    parents: Vec<String>,
}

impl CommitBuilder {
    /// Commit `tree` with `message` on top of `parents`
    pub fn new(tree: impl Into<String>, message: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            tree: tree.into(),
            message: message.into(),
            parents,
        }
    }

    /// Root tree id
    pub fn tree(&self) -> &str {
        &self.tree
    }

    /// Commit message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Parent commit ids
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// The request document
    pub fn request(&self) -> CreateCommitRequest {
        CreateCommitRequest {
            message: self.message.clone(),
            tree: self.tree.clone(),
            parents: self.parents.clone(),
        }
    }

    /// Create the commit remotely
    ///
    /// # Errors
    ///
    /// [`GraphError::CommitCreateFailed`] when the message is empty or the
    /// remote refuses the commit.
    pub async fn save(&self, store: &dyn ObjectStore, repo: &RepoSlug) -> GraphResult<SavedCommit> {
        if self.message.trim().is_empty() {
            return Err(GraphError::CommitCreateFailed("commit message is empty".to_string()));
        }

        debug!(tree = %self.tree, parents = ?self.parents, "Creating commit");

        let created = store
            .create_commit(repo, &self.request())
            .await
            .map_err(|err| GraphError::CommitCreateFailed(err.to_string()))?;

        info!(sha = %created.sha, tree = %self.tree, "Created commit");

        Ok(SavedCommit {
            sha: created.sha,
            tree: self.tree.clone(),
            parents: self.parents.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let builder = CommitBuilder::new("t1", "Update assets", vec!["c0".to_string()]);
        let request = builder.request();
        assert_eq!(request.tree, "t1");
        assert_eq!(request.message, "Update assets");
        assert_eq!(request.parents, vec!["c0".to_string()]);
        assert_eq!(builder.parents(), ["c0".to_string()]);
    }
}
