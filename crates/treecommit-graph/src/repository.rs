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

//! Repository resolution

use std::str::FromStr;
use tracing::{debug, info};
use treecommit_protocol::{ObjectStore, ProtocolError, RepoSlug, RepositoryInfo};

use crate::error::{GraphError, GraphResult};

/// A repository identity, resolved against the remote on [`load`](RepositoryHandle::load)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    slug: RepoSlug,
    info: Option<RepositoryInfo>,
}

impl RepositoryHandle {
    /// Parse an `owner/name` identity
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidRepository`] when the identity is malformed.
    pub fn new(identity: &str) -> GraphResult<Self> {
        let slug = RepoSlug::from_str(identity)
            .map_err(|_| GraphError::InvalidRepository(identity.to_string()))?;
        Ok(Self { slug, info: None })
    }

    /// Owner and name
    pub fn slug(&self) -> &RepoSlug {
        &self.slug
    }

    /// Whether [`load`](Self::load) has succeeded
    pub fn is_loaded(&self) -> bool {
        self.info.is_some()
    }

    /// Numeric id, once loaded
    pub fn id(&self) -> Option<u64> {
        self.info.as_ref().map(|info| info.id)
    }

    /// Default branch, once loaded
    pub fn default_branch(&self) -> Option<&str> {
        self.info.as_ref().map(|info| info.default_branch.as_str())
    }

    /// Look the repository up, caching its id and default branch
    ///
    /// Performs exactly one remote call.
    ///
    /// # Errors
    ///
    /// - [`GraphError::RepositoryNotFound`] when the remote answers 404
    /// - [`GraphError::Unauthorized`] when the credentials are refused
    pub async fn load(&mut self, store: &dyn ObjectStore) -> GraphResult<&RepositoryInfo> {
        debug!(repo = %self.slug, "Resolving repository");

        let info = store.get_repository(&self.slug).await.map_err(|err| match err {
            ProtocolError::NotFound { .. } => GraphError::RepositoryNotFound(self.slug.to_string()),
            other => GraphError::from(other),
        })?;

        info!(
            repo = %self.slug,
            id = info.id,
            default_branch = %info.default_branch,
            "Resolved repository"
        );

        Ok(self.info.insert(info))
    }
}
