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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Repository identity, `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    /// Account or organization owning the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoSlug {
    /// Build a slug from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoSlug {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoSlug::new(owner, name))
            }
            _ => Err(ProtocolError::InvalidSlug(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Response for `GET /repos/{owner}/{repo}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Numeric repository id
    pub id: u64,
    /// Branch new references default to
    pub default_branch: String,
}

/// A reference resolved down to its commit and that commit's root tree
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInfo {
    /// Normalized reference name (e.g. `heads/main`)
    pub name: String,
    /// Commit the reference points at
    pub commit_sha: String,
    /// Root tree of that commit
    pub tree_sha: String,
}

/// Git object kinds that appear on the wire
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// File content
    Blob,
    /// Directory listing
    Tree,
    /// Snapshot with history
    Commit,
    /// Annotated tag
    Tag,
}

/// Tree entry mode, serialized as the octal string git uses
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Regular file (100644)
    #[default]
    #[serde(rename = "100644")]
    Regular,
    /// Executable file (100755)
    #[serde(rename = "100755")]
    Executable,
    /// Symlink (120000)
    #[serde(rename = "120000")]
    Symlink,
}

impl FileMode {
    /// Octal string form
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a tree creation request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Entry mode
    pub mode: FileMode,
    /// Object kind; always `blob` for uploaded files
    #[serde(rename = "type")]
    pub kind: ObjectType,
    /// Blob id
    pub sha: String,
}

impl TreeEntry {
    /// Entry for an uploaded blob
    pub fn blob(path: impl Into<String>, mode: FileMode, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode,
            kind: ObjectType::Blob,
            sha: sha.into(),
        }
    }
}

/// Request for `POST /repos/{owner}/{repo}/git/trees`
///
/// Entries are layered over `base_tree`: paths not mentioned keep the base
/// tree's content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateTreeRequest {
    /// Tree the entries are layered over
    pub base_tree: String,
    /// Added or replaced entries
    pub tree: Vec<TreeEntry>,
}

/// Request for `POST /repos/{owner}/{repo}/git/commits`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateCommitRequest {
    /// Commit message
    pub message: String,
    /// Root tree of the commit
    pub tree: String,
    /// Parent commits, in order
    pub parents: Vec<String>,
}

/// Request for `PATCH /repos/{owner}/{repo}/git/refs/{ref}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpdateRefRequest {
    /// Commit the reference should point at
    pub sha: String,
    /// Allow non-fast-forward moves
    pub force: bool,
}

impl UpdateRefRequest {
    /// Fast-forward-only update to `sha`
    pub fn fast_forward(sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            force: false,
        }
    }
}

/// Request body for `POST /repos/{owner}/{repo}/git/blobs`, in its buffered form
///
/// Uploads never build this: they stream the same document through
/// [`crate::streaming::StreamingBlobEncoder`]. It exists for parsing the
/// streamed body back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateBlobRequest {
    /// Content encoding, `base64` for uploads
    pub encoding: String,
    /// Encoded content
    pub content: String,
}

/// Id assigned to a newly created object
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedObject {
    /// Object id
    pub sha: String,
}

/// Result of a fast-forward reference update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdateOutcome {
    /// The reference now points at `sha`
    Updated {
        /// New target
        sha: String,
    },
    /// The remote refused the move; the reference is unchanged
    Rejected {
        /// Remote's explanation
        reason: String,
    },
}

impl RefUpdateOutcome {
    /// Whether the update was applied
    pub fn is_updated(&self) -> bool {
        matches!(self, RefUpdateOutcome::Updated { .. })
    }
}

/// `GET /git/ref/{ref}` response
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct GitRefResponse {
    pub object: GitObjectPointer,
}

/// `GET /git/tags/{sha}` response
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct GitTagResponse {
    pub object: GitObjectPointer,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct GitObjectPointer {
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
}

/// `GET /git/commits/{sha}` response
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct GitCommitResponse {
    pub tree: CreatedObject,
}

/// GitHub error document
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}
