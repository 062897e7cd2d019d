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

//! Error types for the object store protocol

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while talking to the remote object store
///
/// HTTP outcomes are classified by status only; callers attach meaning
/// (a 404 on a repository lookup and a 404 on a reference lookup are
/// different failures to the pipeline).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A file could not be opened or read while streaming its blob
    #[error("Failed to read {}: {source}", path.display())]
    FileUnreadable {
        /// File being uploaded
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The remote answered 404
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up
        resource: String,
    },

    /// The remote answered 401 or 403
    #[error("Unauthorized (HTTP {status}) for {resource}: {message}")]
    Unauthorized {
        /// What was accessed
        resource: String,
        /// HTTP status code
        status: u16,
        /// Remote's explanation
        message: String,
    },

    /// The remote refused the request as invalid (HTTP 409 or 422)
    #[error("Rejected (HTTP {status}) by {resource}: {message}")]
    Rejected {
        /// Endpoint that refused
        resource: String,
        /// HTTP status code
        status: u16,
        /// Remote's explanation
        message: String,
    },

    /// Any other non-success status
    #[error("Unexpected HTTP status {status} from {resource}: {message}")]
    UnexpectedStatus {
        /// Endpoint called
        resource: String,
        /// HTTP status code
        status: u16,
        /// Remote's explanation
        message: String,
    },

    /// The response could not be understood
    #[error("Invalid response from {resource}: {message}")]
    InvalidResponse {
        /// Endpoint called
        resource: String,
        /// What was wrong with it
        message: String,
    },

    /// Repository identity is not `owner/name`
    #[error("Invalid repository identity '{0}', expected 'owner/name'")]
    InvalidSlug(String),

    /// The token cannot be sent as an HTTP header
    #[error("Token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// Connection, TLS, timeout or client construction failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProtocolError {
    /// Whether the remote reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProtocolError::NotFound { .. })
    }

    /// Whether the remote refused the credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ProtocolError::Unauthorized { .. })
    }
}
