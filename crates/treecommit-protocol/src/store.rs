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

//! Remote object store abstraction
//!
//! The commit pipeline never talks HTTP directly. It drives an
//! [`ObjectStore`], which the GitHub client implements for production and an
//! in-memory store implements for tests.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ProtocolResult;
use crate::streaming::BlobBody;
use crate::types::{
    CreateCommitRequest, CreateTreeRequest, CreatedObject, RefUpdateOutcome, ReferenceInfo,
    RepoSlug, RepositoryInfo, UpdateRefRequest,
};

/// Operations of a remote Git object database
///
/// Reference names are given in normalized form: `heads/<branch>` or
/// `tags/<tag>`, never with a leading `refs/`.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; blob uploads run on several tasks
/// - Every creation call writes a new object; none of them are retried here
/// - `update_reference` reports a refused fast-forward as
///   [`RefUpdateOutcome::Rejected`], not as an error
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Look up a repository
    ///
    /// # Errors
    ///
    /// [`crate::ProtocolError::NotFound`] when the repository does not exist
    /// or is invisible to the caller.
    async fn get_repository(&self, repo: &RepoSlug) -> ProtocolResult<RepositoryInfo>;

    /// Resolve a reference to its commit and root tree
    ///
    /// Annotated tags are peeled to the commit they point at.
    async fn get_reference(&self, repo: &RepoSlug, ref_name: &str)
        -> ProtocolResult<ReferenceInfo>;

    /// Upload one blob from a streamed body
    async fn create_blob(&self, repo: &RepoSlug, body: BlobBody) -> ProtocolResult<CreatedObject>;

    /// Create a tree layered over a base tree
    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTreeRequest,
    ) -> ProtocolResult<CreatedObject>;

    /// Create a commit
    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommitRequest,
    ) -> ProtocolResult<CreatedObject>;

    /// Move a reference
    async fn update_reference(
        &self,
        repo: &RepoSlug,
        ref_name: &str,
        request: &UpdateRefRequest,
    ) -> ProtocolResult<RefUpdateOutcome>;
}
