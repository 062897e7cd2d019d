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

//! In-memory object store for testing
//!
//! [`MemoryObjectStore`] behaves like a small Git data API: blobs, layered
//! trees, commits with parents, and references that only move by fast-forward
//! unless forced. Every call is recorded so tests can assert what the pipeline
//! did, including that it wrote nothing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use treecommit_protocol::{ObjectStore, RepoSlug};
//! use treecommit_test_utils::MemoryObjectStore;
//!
//! # async fn example() -> treecommit_protocol::ProtocolResult<()> {
//! let store = MemoryObjectStore::new();
//! let repo = RepoSlug::new("octo", "hello");
//! let initial = store.add_repository(&repo, "main").await;
//!
//! let head = store.get_reference(&repo, "heads/main").await?;
//! assert_eq!(head.commit_sha, initial);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use treecommit_protocol::{
    BlobBody, CreateBlobRequest, CreateCommitRequest, CreateTreeRequest, CreatedObject, FileMode,
    ObjectStore, ProtocolError, ProtocolResult, RefUpdateOutcome, ReferenceInfo, RepoSlug,
    RepositoryInfo, TreeEntry, UpdateRefRequest,
};

/// A recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_repository`
    GetRepository,
    /// `get_reference` with the requested name
    GetReference(String),
    /// `create_blob` for the file at this path
    CreateBlob(PathBuf),
    /// `create_tree`
    CreateTree,
    /// `create_commit`
    CreateCommit,
    /// `update_reference` with the requested name
    UpdateReference(String),
}

impl StoreCall {
    /// Whether the call creates or moves something
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreCall::GetRepository | StoreCall::GetReference(_))
    }
}

/// Operations that can be made to fail with an HTTP 500
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    /// Blob uploads
    CreateBlob,
    /// Tree creation
    CreateTree,
    /// Commit creation
    CreateCommit,
    /// Reference updates
    UpdateReference,
}

/// A commit as the store keeps it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommit {
    /// Commit message
    pub message: String,
    /// Root tree id
    pub tree: String,
    /// Parent commit ids
    pub parents: Vec<String>,
}

#[derive(Debug)]
struct RepoState {
    info: RepositoryInfo,
    blobs: HashMap<String, Vec<u8>>,
    trees: HashMap<String, BTreeMap<String, TreeEntry>>,
    commits: HashMap<String, StoredCommit>,
    refs: HashMap<String, String>,
}

impl RepoState {
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut queue = VecDeque::from([descendant.to_string()]);
        let mut seen = HashSet::new();

        while let Some(sha) = queue.pop_front() {
            if sha == ancestor {
                return true;
            }
            if !seen.insert(sha.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&sha) {
                queue.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn insert_tree(&mut self, entries: BTreeMap<String, TreeEntry>) -> String {
        let mut listing = Vec::new();
        for entry in entries.values() {
            listing.extend_from_slice(
                format!("{} {} {}\n", entry.mode, entry.path, entry.sha).as_bytes(),
            );
        }
        let sha = object_id("tree", &listing);
        self.trees.insert(sha.clone(), entries);
        sha
    }

    fn insert_commit(&mut self, commit: StoredCommit, sequence: u64) -> String {
        let text = format!(
            "tree {}\nparents {}\nsequence {}\n\n{}",
            commit.tree,
            commit.parents.join(" "),
            sequence,
            commit.message
        );
        let sha = object_id("commit", text.as_bytes());
        self.commits.insert(sha.clone(), commit);
        sha
    }
}

#[derive(Debug, Default)]
struct State {
    repos: HashMap<RepoSlug, RepoState>,
    calls: Vec<StoreCall>,
    failures: HashSet<FailOn>,
    denied: bool,
    commit_sequence: u64,
}

impl State {
    fn next_sequence(&mut self) -> u64 {
        self.commit_sequence += 1;
        self.commit_sequence
    }

    fn check(&self, op: Option<FailOn>, resource: &str) -> ProtocolResult<()> {
        if self.denied {
            return Err(ProtocolError::Unauthorized {
                resource: resource.to_string(),
                status: 401,
                message: "Bad credentials".to_string(),
            });
        }
        if let Some(op) = op {
            if self.failures.contains(&op) {
                return Err(ProtocolError::UnexpectedStatus {
                    resource: resource.to_string(),
                    status: 500,
                    message: "injected failure".to_string(),
                });
            }
        }
        Ok(())
    }

    fn repo(&self, slug: &RepoSlug) -> ProtocolResult<&RepoState> {
        self.repos.get(slug).ok_or_else(|| ProtocolError::NotFound {
            resource: format!("repository {}", slug),
        })
    }

    fn repo_mut(&mut self, slug: &RepoSlug) -> ProtocolResult<&mut RepoState> {
        self.repos.get_mut(slug).ok_or_else(|| ProtocolError::NotFound {
            resource: format!("repository {}", slug),
        })
    }
}

/// Thread-safe in-memory [`ObjectStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    state: Arc<RwLock<State>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    blob_delay: Option<Duration>,
}

impl MemoryObjectStore {
    /// Create an empty store with no repositories
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each blob upload open for `delay`, so overlapping uploads can be observed
    pub fn with_blob_delay(mut self, delay: Duration) -> Self {
        self.blob_delay = Some(delay);
        self
    }

    /// Create a repository whose default branch holds one commit with an empty tree
    ///
    /// Returns the id of that commit.
    pub async fn add_repository(&self, slug: &RepoSlug, default_branch: &str) -> String {
        let mut state = self.state.write().await;
        let sequence = state.next_sequence();

        let mut repo = RepoState {
            info: RepositoryInfo {
                id: state.repos.len() as u64 + 1,
                default_branch: default_branch.to_string(),
            },
            blobs: HashMap::new(),
            trees: HashMap::new(),
            commits: HashMap::new(),
            refs: HashMap::new(),
        };

        let tree = repo.insert_tree(BTreeMap::new());
        let commit = repo.insert_commit(
            StoredCommit {
                message: "Initial commit".to_string(),
                tree,
                parents: Vec::new(),
            },
            sequence,
        );
        repo.refs
            .insert(format!("heads/{}", default_branch), commit.clone());

        state.repos.insert(slug.clone(), repo);
        commit
    }

    /// Commit `files` on top of `ref_name` and move the reference, bypassing call recording
    ///
    /// Returns the new commit id.
    pub async fn seed_files(
        &self,
        slug: &RepoSlug,
        ref_name: &str,
        files: &[(&str, &str)],
    ) -> ProtocolResult<String> {
        let mut state = self.state.write().await;
        let sequence = state.next_sequence();
        let repo = state.repo_mut(slug)?;

        let head = lookup_ref(repo, ref_name)?;
        let mut entries = repo.trees[&repo.commits[&head].tree].clone();

        for (path, content) in files {
            let sha = object_id("blob", content.as_bytes());
            repo.blobs.insert(sha.clone(), content.as_bytes().to_vec());
            entries.insert(
                path.to_string(),
                TreeEntry::blob(*path, FileMode::Regular, sha),
            );
        }

        let tree = repo.insert_tree(entries);
        let commit = repo.insert_commit(
            StoredCommit {
                message: "Seed files".to_string(),
                tree,
                parents: vec![head],
            },
            sequence,
        );
        repo.refs.insert(ref_name.to_string(), commit.clone());
        Ok(commit)
    }

    /// Move `ref_name` to a new commit on top of its current head, as a
    /// concurrent writer would
    pub async fn advance_reference(&self, slug: &RepoSlug, ref_name: &str) -> ProtocolResult<String> {
        let mut state = self.state.write().await;
        let sequence = state.next_sequence();
        let repo = state.repo_mut(slug)?;

        let head = lookup_ref(repo, ref_name)?;
        let tree = repo.commits[&head].tree.clone();
        let commit = repo.insert_commit(
            StoredCommit {
                message: "Concurrent update".to_string(),
                tree,
                parents: vec![head],
            },
            sequence,
        );
        repo.refs.insert(ref_name.to_string(), commit.clone());
        Ok(commit)
    }

    /// Point `ref_name` at an existing commit, creating the reference if needed
    pub async fn set_reference(&self, slug: &RepoSlug, ref_name: &str, sha: &str) -> ProtocolResult<()> {
        let mut state = self.state.write().await;
        let repo = state.repo_mut(slug)?;
        repo.refs.insert(ref_name.to_string(), sha.to_string());
        Ok(())
    }

    /// Make every later call of `op` fail
    pub async fn fail_on(&self, op: FailOn) {
        self.state.write().await.failures.insert(op);
    }

    /// Reject every later call as unauthorized
    pub async fn deny_access(&self) {
        self.state.write().await.denied = true;
    }

    /// Current target of a reference
    pub async fn reference(&self, slug: &RepoSlug, ref_name: &str) -> Option<String> {
        let state = self.state.read().await;
        state.repos.get(slug)?.refs.get(ref_name).cloned()
    }

    /// Content of a stored blob
    pub async fn blob(&self, slug: &RepoSlug, sha: &str) -> Option<Vec<u8>> {
        let state = self.state.read().await;
        state.repos.get(slug)?.blobs.get(sha).cloned()
    }

    /// Number of distinct blobs stored in a repository
    pub async fn blob_count(&self, slug: &RepoSlug) -> usize {
        let state = self.state.read().await;
        state.repos.get(slug).map_or(0, |repo| repo.blobs.len())
    }

    /// Entries of a stored tree, keyed by path
    pub async fn tree(&self, slug: &RepoSlug, sha: &str) -> Option<BTreeMap<String, TreeEntry>> {
        let state = self.state.read().await;
        state.repos.get(slug)?.trees.get(sha).cloned()
    }

    /// A stored commit
    pub async fn commit(&self, slug: &RepoSlug, sha: &str) -> Option<StoredCommit> {
        let state = self.state.read().await;
        state.repos.get(slug)?.commits.get(sha).cloned()
    }

    /// Path to content map of the tree a reference points at
    pub async fn files_at(&self, slug: &RepoSlug, ref_name: &str) -> Option<BTreeMap<String, Vec<u8>>> {
        let state = self.state.read().await;
        let repo = state.repos.get(slug)?;
        let head = repo.refs.get(ref_name)?;
        let tree = repo.trees.get(&repo.commits.get(head)?.tree)?;

        tree.iter()
            .map(|(path, entry)| Some((path.clone(), repo.blobs.get(&entry.sha)?.clone())))
            .collect()
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.read().await.calls.clone()
    }

    /// Calls that created or moved something
    pub async fn write_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .await
            .into_iter()
            .filter(StoreCall::is_write)
            .collect()
    }

    /// Most blob uploads observed in progress at once
    pub fn max_concurrent_blob_uploads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, call: StoreCall) {
        self.state.write().await.calls.push(call);
    }

    async fn receive_blob(&self, body: BlobBody) -> ProtocolResult<Vec<u8>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.blob_delay {
            tokio::time::sleep(delay).await;
        }

        let expected = body.content_length();
        let result = body.collect().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let document = result?;
        let rejected = |message: String| ProtocolError::Rejected {
            resource: "blob upload".to_string(),
            status: 400,
            message,
        };

        if document.len() as u64 != expected {
            return Err(rejected(format!(
                "declared {} bytes, received {}",
                expected,
                document.len()
            )));
        }

        let request: CreateBlobRequest =
            serde_json::from_slice(&document).map_err(|e| rejected(e.to_string()))?;
        if request.encoding != "base64" {
            return Err(rejected(format!("unsupported encoding {}", request.encoding)));
        }
        STANDARD
            .decode(request.content.as_bytes())
            .map_err(|e| rejected(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_repository(&self, repo: &RepoSlug) -> ProtocolResult<RepositoryInfo> {
        self.record(StoreCall::GetRepository).await;
        let state = self.state.read().await;
        state.check(None, "repository")?;
        Ok(state.repo(repo)?.info.clone())
    }

    async fn get_reference(&self, repo: &RepoSlug, ref_name: &str) -> ProtocolResult<ReferenceInfo> {
        self.record(StoreCall::GetReference(ref_name.to_string())).await;
        let state = self.state.read().await;
        state.check(None, "reference")?;
        let repo = state.repo(repo)?;

        let commit_sha = lookup_ref(repo, ref_name)?;
        let tree_sha = repo.commits[&commit_sha].tree.clone();
        Ok(ReferenceInfo {
            name: ref_name.to_string(),
            commit_sha,
            tree_sha,
        })
    }

    async fn create_blob(&self, repo: &RepoSlug, body: BlobBody) -> ProtocolResult<CreatedObject> {
        self.record(StoreCall::CreateBlob(body.path().to_path_buf())).await;
        {
            let state = self.state.read().await;
            state.check(Some(FailOn::CreateBlob), "blob upload")?;
            state.repo(repo)?;
        }

        let content = self.receive_blob(body).await?;
        let sha = object_id("blob", &content);

        let mut state = self.state.write().await;
        state.repo_mut(repo)?.blobs.insert(sha.clone(), content);
        Ok(CreatedObject { sha })
    }

    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTreeRequest,
    ) -> ProtocolResult<CreatedObject> {
        self.record(StoreCall::CreateTree).await;
        let mut state = self.state.write().await;
        state.check(Some(FailOn::CreateTree), "tree creation")?;
        let repo = state.repo_mut(repo)?;

        let rejected = |message: String| ProtocolError::Rejected {
            resource: "tree creation".to_string(),
            status: 422,
            message,
        };

        let mut entries = repo
            .trees
            .get(&request.base_tree)
            .cloned()
            .ok_or_else(|| rejected(format!("base_tree {} is not a valid tree", request.base_tree)))?;

        for entry in &request.tree {
            if !repo.blobs.contains_key(&entry.sha) {
                return Err(rejected(format!("tree.sha {} is not a valid blob", entry.sha)));
            }
            entries.insert(entry.path.clone(), entry.clone());
        }

        let sha = repo.insert_tree(entries);
        Ok(CreatedObject { sha })
    }

    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommitRequest,
    ) -> ProtocolResult<CreatedObject> {
        self.record(StoreCall::CreateCommit).await;
        let mut state = self.state.write().await;
        state.check(Some(FailOn::CreateCommit), "commit creation")?;
        let sequence = state.next_sequence();
        let repo = state.repo_mut(repo)?;

        let rejected = |message: String| ProtocolError::Rejected {
            resource: "commit creation".to_string(),
            status: 422,
            message,
        };

        if !repo.trees.contains_key(&request.tree) {
            return Err(rejected(format!("Tree SHA {} does not exist", request.tree)));
        }
        if let Some(parent) = request.parents.iter().find(|p| !repo.commits.contains_key(*p)) {
            return Err(rejected(format!("Parent SHA {} does not exist", parent)));
        }

        let sha = repo.insert_commit(
            StoredCommit {
                message: request.message.clone(),
                tree: request.tree.clone(),
                parents: request.parents.clone(),
            },
            sequence,
        );
        Ok(CreatedObject { sha })
    }

    async fn update_reference(
        &self,
        repo: &RepoSlug,
        ref_name: &str,
        request: &UpdateRefRequest,
    ) -> ProtocolResult<RefUpdateOutcome> {
        self.record(StoreCall::UpdateReference(ref_name.to_string())).await;
        let mut state = self.state.write().await;
        state.check(Some(FailOn::UpdateReference), "reference update")?;
        let repo = state.repo_mut(repo)?;

        let reject = |reason: &str| RefUpdateOutcome::Rejected {
            reason: reason.to_string(),
        };

        let Some(current) = repo.refs.get(ref_name).cloned() else {
            return Ok(reject("Reference does not exist"));
        };
        if !repo.commits.contains_key(&request.sha) {
            return Ok(reject("Object does not exist"));
        }
        if !request.force && !repo.is_ancestor(&current, &request.sha) {
            return Ok(reject("Update is not a fast forward"));
        }

        repo.refs.insert(ref_name.to_string(), request.sha.clone());
        Ok(RefUpdateOutcome::Updated {
            sha: request.sha.clone(),
        })
    }
}

fn lookup_ref(repo: &RepoState, ref_name: &str) -> ProtocolResult<String> {
    repo.refs
        .get(ref_name)
        .cloned()
        .ok_or_else(|| ProtocolError::NotFound {
            resource: format!("reference {}", ref_name),
        })
}

/// Content-addressed id in the 40 hex digit shape of a git object id
fn object_id(kind: &str, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{} {}\0", kind, data.len()).as_bytes());
    hasher.update(data);
    let mut id = hex::encode(hasher.finalize());
    id.truncate(40);
    id
}
