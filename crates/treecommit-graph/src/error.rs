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

//! Error types for the commit pipeline

use std::path::PathBuf;
use thiserror::Error;
use treecommit_protocol::ProtocolError;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Failures of the blob, tree, commit and reference stages
///
/// Every variant is fatal to a pipeline run.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A file to upload could not be opened or read
    #[error("Failed to read {}: {source}", path.display())]
    FileUnreadable {
        /// File being uploaded
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The repository does not exist or is not visible with the given credentials
    #[error("Repository {0} not found")]
    RepositoryNotFound(String),

    /// The remote refused the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The reference to commit onto does not exist
    #[error("Reference {0} not found")]
    RefNotFound(String),

    /// A blob cannot be placed in a tree
    #[error("Invalid tree entry '{path}': {reason}")]
    InvalidTreeEntry {
        /// Offending path
        path: String,
        /// Why it was refused
        reason: String,
    },

    /// The commit could not be created
    #[error("Failed to create commit: {0}")]
    CommitCreateFailed(String),

    /// The reference moved since it was read, or the remote refused the move
    #[error("Reference {reference} was not updated (not a fast-forward): {reason}")]
    NonFastForward {
        /// Reference that was left unchanged
        reference: String,
        /// Remote's explanation
        reason: String,
    },

    /// A listed file does not exist and missing files are not allowed
    #[error("File {} does not exist", .0.display())]
    MissingFile(PathBuf),

    /// Repository identity is not `owner/name`
    #[error("Invalid repository identity '{0}', expected 'owner/name'")]
    InvalidRepository(String),

    /// An upload task ended without a result
    #[error("Upload task failed: {0}")]
    TaskFailed(String),

    /// Any other failure talking to the remote
    #[error(transparent)]
    Remote(ProtocolError),
}

impl From<ProtocolError> for GraphError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::FileUnreadable { path, source } => {
                GraphError::FileUnreadable { path, source }
            }
            ProtocolError::Unauthorized {
                resource, message, ..
            } => GraphError::Unauthorized(format!("{}: {}", resource, message)),
            ProtocolError::InvalidSlug(slug) => GraphError::InvalidRepository(slug),
            other => GraphError::Remote(other),
        }
    }
}
