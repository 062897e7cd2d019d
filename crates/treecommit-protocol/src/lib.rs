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

//! Wire layer for treecommit
//!
//! This crate talks to a GitHub-style Git data API:
//!
//! - [`streaming`]: turns a file into a blob request body without buffering it
//! - [`store`]: the [`ObjectStore`] trait the commit pipeline is written against
//! - [`client`]: [`GitHubClient`], the HTTP implementation of that trait
//! - [`types`]: request and response documents
//!
//! # Example
//!
//! ```rust,no_run
//! use treecommit_protocol::{ClientOptions, GitHubClient, ObjectStore, RepoSlug};
//!
//! # async fn example() -> treecommit_protocol::ProtocolResult<()> {
//! let client = GitHubClient::new(ClientOptions {
//!     token: std::env::var("GITHUB_TOKEN").ok(),
//!     ..ClientOptions::default()
//! })?;
//!
//! let repo: RepoSlug = "octo/hello-world".parse()?;
//! let info = client.get_repository(&repo).await?;
//! let head = client
//!     .get_reference(&repo, &format!("heads/{}", info.default_branch))
//!     .await?;
//! println!("{} is at {}", info.default_branch, head.commit_sha);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod store;
pub mod streaming;
pub mod types;

pub use client::{encode_ref_path, ClientOptions, GitHubClient, API_VERSION, DEFAULT_API_URL};
pub use error::{ProtocolError, ProtocolResult};
pub use store::ObjectStore;
pub use streaming::{BlobBody, ReadFailure, StreamingBlobEncoder, DEFAULT_CHUNK_SIZE};
pub use types::{
    CreateBlobRequest, CreateCommitRequest, CreateTreeRequest, CreatedObject, FileMode,
    ObjectType, RefUpdateOutcome, ReferenceInfo, RepoSlug, RepositoryInfo, TreeEntry,
    UpdateRefRequest,
};
