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

//! Commit pipeline for treecommit
//!
//! This crate turns a list of local files into a commit on a remote
//! reference, using only the Git data operations of an
//! [`ObjectStore`](treecommit_protocol::ObjectStore):
//!
//! - [`blob`]: which files to commit, and their concurrent upload
//! - [`repository`]: repository identity and default branch
//! - [`reference`]: reference resolution and fast-forward updates
//! - [`tree`]: a new tree layered over the reference's tree
//! - [`commit`]: a commit on top of the reference's commit
//! - [`pipeline`]: all of the above, in order
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use treecommit_graph::{CommitPipeline, CommitRequest, MissingFilePolicy, Outcome, UploadOptions};
//! use treecommit_protocol::{ClientOptions, GitHubClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GitHubClient::new(ClientOptions::default())?;
//!     let pipeline = CommitPipeline::new(Arc::new(client));
//!
//!     let outcome = pipeline
//!         .run(CommitRequest {
//!             repository: "octo/hello-world".to_string(),
//!             ref_name: None,
//!             files: "assets/logo.png\nREADME.md".to_string(),
//!             base_dir: std::env::current_dir()?,
//!             message: "Update assets".to_string(),
//!             missing_files: MissingFilePolicy::Permissive,
//!             upload: UploadOptions::default(),
//!         })
//!         .await?;
//!
//!     if let Outcome::Committed { commit_sha, .. } = outcome {
//!         println!("{}", commit_sha);
//!     }
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod commit;
pub mod error;
pub mod pipeline;
pub mod reference;
pub mod repository;
pub mod tree;

pub use blob::{
    git_path_for, Blob, BlobSet, MissingFilePolicy, UploadOptions, DEFAULT_UPLOAD_CONCURRENCY,
};
pub use commit::{CommitBuilder, SavedCommit};
pub use error::{GraphError, GraphResult};
pub use pipeline::{CommitPipeline, CommitRequest, Outcome};
pub use reference::{normalize_ref_name, ReferenceHandle, ResolvedReference};
pub use repository::RepositoryHandle;
pub use tree::TreeBuilder;
