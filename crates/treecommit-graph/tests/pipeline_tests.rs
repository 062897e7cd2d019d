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

// Integration tests for the commit pipeline
// These tests run the full blob -> tree -> commit -> reference flow against
// the in-memory object store

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use treecommit_graph::{
    BlobSet, CommitBuilder, CommitPipeline, CommitRequest, GraphError, MissingFilePolicy, Outcome,
    ReferenceHandle, TreeBuilder, UploadOptions,
};
use treecommit_protocol::{
    BlobBody, CreateCommitRequest, CreateTreeRequest, CreatedObject, FileMode, ObjectStore,
    ProtocolResult, RefUpdateOutcome, ReferenceInfo, RepoSlug, RepositoryInfo, UpdateRefRequest,
};
use treecommit_test_utils::{FailOn, MemoryObjectStore, StoreCall, TestWorkspace};

fn slug() -> RepoSlug {
    RepoSlug::new("octo", "hello")
}

fn request(workspace: &TestWorkspace, files: &str) -> CommitRequest {
    CommitRequest {
        repository: "octo/hello".to_string(),
        ref_name: None,
        files: files.to_string(),
        base_dir: workspace.path().to_path_buf(),
        message: "Update files".to_string(),
        missing_files: MissingFilePolicy::Permissive,
        upload: UploadOptions::default(),
    }
}

async fn store_with_repo() -> (MemoryObjectStore, String) {
    let store = MemoryObjectStore::new();
    store.add_repository(&slug(), "main").await;
    let head = store
        .seed_files(&slug(), "heads/main", &[("README.md", "# hello\n")])
        .await
        .unwrap();
    (store, head)
}

#[tokio::test]
async fn test_commits_files_onto_default_branch() {
    let (store, old_head) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("assets/logo.svg", b"<svg/>");
    workspace.write_file("notes.txt", b"hello");

    let pipeline = CommitPipeline::new(Arc::new(store.clone()));
    let outcome = pipeline
        .run(request(&workspace, "assets/logo.svg\nnotes.txt\n"))
        .await
        .unwrap();

    let Outcome::Committed {
        commit_sha,
        tree_sha,
        reference,
        files,
    } = outcome.clone()
    else {
        panic!("expected a commit, got {:?}", outcome);
    };
    assert_eq!(reference, "heads/main");
    assert_eq!(files, 2);
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(commit_sha.clone()));

    let commit = store.commit(&slug(), &commit_sha).await.unwrap();
    assert_eq!(commit.parents, vec![old_head]);
    assert_eq!(commit.tree, tree_sha);
    assert_eq!(commit.message, "Update files");

    let tree = store.files_at(&slug(), "heads/main").await.unwrap();
    assert_eq!(tree["README.md"], b"# hello\n".to_vec());
    assert_eq!(tree["assets/logo.svg"], b"<svg/>".to_vec());
    assert_eq!(tree["notes.txt"], b"hello".to_vec());
}

#[tokio::test]
async fn test_stage_order() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    let path = workspace.write_file("a.txt", b"a");

    CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "a.txt"))
        .await
        .unwrap();

    assert_eq!(
        store.calls().await,
        vec![
            StoreCall::GetRepository,
            StoreCall::GetReference("heads/main".to_string()),
            StoreCall::CreateBlob(path),
            StoreCall::CreateTree,
            StoreCall::CreateCommit,
            StoreCall::UpdateReference("heads/main".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_empty_file_list_makes_no_calls() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();

    let pipeline = CommitPipeline::new(Arc::new(store.clone()));
    for files in ["", "  \n\t\n"] {
        let outcome = pipeline.run(request(&workspace, files)).await.unwrap();
        assert_eq!(outcome, Outcome::NoFiles);
    }
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_all_paths_missing_writes_nothing() {
    let (store, head) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.create_dir("just-a-dir");

    let outcome = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "gone.txt\njust-a-dir"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::NoChanges {
            reference: "heads/main".to_string()
        }
    );
    assert!(outcome.commit_sha().is_none());
    assert!(store.write_calls().await.is_empty());
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
}

#[tokio::test]
async fn test_missing_files_dropped_in_permissive_mode() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("kept.txt", b"kept");

    let outcome = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "deleted.txt\nkept.txt"))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Committed { files: 1, .. }));
    let tree = store.files_at(&slug(), "heads/main").await.unwrap();
    assert!(tree.contains_key("kept.txt"));
    assert!(!tree.contains_key("deleted.txt"));
}

#[tokio::test]
async fn test_strict_mode_fails_before_writing() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("kept.txt", b"kept");

    let mut req = request(&workspace, "kept.txt\ndeleted.txt");
    req.missing_files = MissingFilePolicy::Strict;

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(req)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::MissingFile(path) if path.ends_with("deleted.txt")));
    assert!(store.write_calls().await.is_empty());
}

#[tokio::test]
async fn test_path_outside_base_dir_is_never_uploaded() {
    let workspace = TestWorkspace::new();
    workspace.write_file("checkout/a.txt", b"a");
    let secret = workspace.write_file("secret.txt", b"do not upload");

    let listed = [
        "a.txt\n../secret.txt".to_string(),
        format!("a.txt\n{}", secret.display()),
    ];
    for files in listed {
        for policy in [MissingFilePolicy::Permissive, MissingFilePolicy::Strict] {
            let (store, head) = store_with_repo().await;
            let blobs_before = store.blob_count(&slug()).await;

            let mut req = request(&workspace, &files);
            req.base_dir = workspace.join("checkout");
            req.missing_files = policy;

            let err = CommitPipeline::new(Arc::new(store.clone()))
                .run(req)
                .await
                .unwrap_err();
            assert!(
                matches!(err, GraphError::InvalidTreeEntry { .. }),
                "got {:?}",
                err
            );
            assert!(!store
                .write_calls()
                .await
                .iter()
                .any(|call| matches!(call, StoreCall::CreateBlob(_))));
            assert_eq!(store.blob_count(&slug()).await, blobs_before);
            assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
        }
    }
}

#[tokio::test]
async fn test_explicit_reference_is_normalized() {
    let (store, head) = store_with_repo().await;
    store.set_reference(&slug(), "heads/dev", &head).await.unwrap();
    let workspace = TestWorkspace::new();
    workspace.write_file("dev.txt", b"dev");

    let mut req = request(&workspace, "dev.txt");
    req.ref_name = Some("refs/heads/dev".to_string());

    let outcome = CommitPipeline::new(Arc::new(store.clone()))
        .run(req)
        .await
        .unwrap();

    assert!(matches!(&outcome, Outcome::Committed { reference, .. } if reference == "heads/dev"));
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
    assert_eq!(
        store.reference(&slug(), "heads/dev").await.as_deref(),
        outcome.commit_sha()
    );
}

#[tokio::test]
async fn test_unknown_reference() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let mut req = request(&workspace, "a.txt");
    req.ref_name = Some("nope".to_string());

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(req)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::RefNotFound(name) if name == "heads/nope"));
    assert!(store.write_calls().await.is_empty());
}

#[tokio::test]
async fn test_unknown_repository() {
    let store = MemoryObjectStore::new();
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "a.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::RepositoryNotFound(name) if name == "octo/hello"));
}

#[tokio::test]
async fn test_malformed_repository_identity() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let mut req = request(&workspace, "a.txt");
    req.repository = "not-a-slug".to_string();

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(req)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidRepository(_)));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn test_unauthorized() {
    let (store, _) = store_with_repo().await;
    store.deny_access().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "a.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Unauthorized(_)));
}

#[tokio::test]
async fn test_blob_failure_stops_before_tree() {
    let (store, head) = store_with_repo().await;
    store.fail_on(FailOn::CreateBlob).await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");
    workspace.write_file("b.txt", b"b");

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "a.txt\nb.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Remote(_)));

    let calls = store.calls().await;
    assert!(!calls.contains(&StoreCall::CreateTree));
    assert!(!calls.contains(&StoreCall::CreateCommit));
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
}

#[tokio::test]
async fn test_commit_failure_leaves_reference() {
    let (store, head) = store_with_repo().await;
    store.fail_on(FailOn::CreateCommit).await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let err = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "a.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::CommitCreateFailed(_)));
    assert!(!store
        .calls()
        .await
        .iter()
        .any(|call| matches!(call, StoreCall::UpdateReference(_))));
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
}

#[tokio::test]
async fn test_upload_concurrency_is_bounded() {
    let store = MemoryObjectStore::new().with_blob_delay(Duration::from_millis(40));
    store.add_repository(&slug(), "main").await;
    let workspace = TestWorkspace::new();

    let mut names = Vec::new();
    for i in 0..10 {
        let name = format!("file-{}.bin", i);
        workspace.write_file(&name, format!("content {}", i).as_bytes());
        names.push(name);
    }

    let mut req = request(&workspace, &names.join("\n"));
    req.upload = UploadOptions {
        chunk_size: 7,
        concurrency: 3,
    };

    let outcome = CommitPipeline::new(Arc::new(store.clone()))
        .run(req)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Committed { files: 10, .. }));

    let peak = store.max_concurrent_blob_uploads();
    assert!(peak <= 3, "peak {}", peak);
    assert!(peak >= 2, "uploads never overlapped");
}

#[tokio::test]
async fn test_identical_content_is_one_blob() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("one.txt", b"same");
    workspace.write_file("two.txt", b"same");

    CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "one.txt\ntwo.txt"))
        .await
        .unwrap();

    // README.md from the seed plus one shared blob
    assert_eq!(store.blob_count(&slug()).await, 2);
    let uploads = store
        .calls()
        .await
        .into_iter()
        .filter(|call| matches!(call, StoreCall::CreateBlob(_)))
        .count();
    assert_eq!(uploads, 2);
}

#[tokio::test]
async fn test_rerun_creates_new_commit() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let pipeline = CommitPipeline::new(Arc::new(store.clone()));
    let first = pipeline.run(request(&workspace, "a.txt")).await.unwrap();
    let second = pipeline.run(request(&workspace, "a.txt")).await.unwrap();

    assert_ne!(first.commit_sha(), second.commit_sha());
    let second_sha = second.commit_sha().unwrap();
    let commit = store.commit(&slug(), second_sha).await.unwrap();
    assert_eq!(commit.parents, vec![first.commit_sha().unwrap().to_string()]);
}

#[tokio::test]
async fn test_empty_file_is_committed() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("empty.txt", b"");

    CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "empty.txt"))
        .await
        .unwrap();

    let tree = store.files_at(&slug(), "heads/main").await.unwrap();
    assert_eq!(tree["empty.txt"], Vec::<u8>::new());
}

#[cfg(unix)]
#[tokio::test]
async fn test_executable_mode_reaches_tree() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_executable("bin/run.sh", b"#!/bin/sh\necho hi\n");

    let outcome = CommitPipeline::new(Arc::new(store.clone()))
        .run(request(&workspace, "bin/run.sh"))
        .await
        .unwrap();

    let Outcome::Committed { tree_sha, .. } = outcome.clone() else {
        panic!("expected a commit");
    };
    let tree = store.tree(&slug(), &tree_sha).await.unwrap();
    assert_eq!(tree["bin/run.sh"].mode, FileMode::Executable);
}

#[tokio::test]
async fn test_stages_compose_by_hand() {
    let (store, head) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("x.txt", b"x");

    let reference = ReferenceHandle::new(slug(), "main").load(&store).await.unwrap();
    assert_eq!(reference.commit_sha(), head);

    let blobs = BlobSet::from_paths("x.txt", workspace.path(), MissingFilePolicy::Strict)
        .unwrap()
        .upload(Arc::new(store.clone()), &slug(), UploadOptions::default())
        .await
        .unwrap();
    assert!(blobs.iter().all(|blob| blob.sha().is_some()));

    let tree = TreeBuilder::from_blobs(reference.tree_sha(), &blobs)
        .unwrap()
        .save(&store, &slug())
        .await
        .unwrap();

    let builder = CommitBuilder::new(tree.clone(), "By hand", vec![head.clone()]);
    let first = builder.save(&store, &slug()).await.unwrap();
    let second = builder.save(&store, &slug()).await.unwrap();
    assert_ne!(first.sha, second.sha, "saving twice creates two commits");
    assert_eq!(first.tree, tree);
    assert_eq!(first.parents, vec![head]);

    let updated = reference.update(&store, &first.sha).await.unwrap();
    assert_eq!(updated, first.sha);
}

#[tokio::test]
async fn test_empty_commit_message_rejected() {
    let (store, head) = store_with_repo().await;
    let err = CommitBuilder::new("t", "  ", vec![head])
        .save(&store, &slug())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::CommitCreateFailed(_)));
    assert!(store.write_calls().await.is_empty());
}

#[tokio::test]
async fn test_denied_commit_is_commit_failure() {
    let (store, head) = store_with_repo().await;
    store.deny_access().await;

    let err = CommitBuilder::new("t", "Update", vec![head.clone()])
        .save(&store, &slug())
        .await
        .unwrap_err();
    match err {
        GraphError::CommitCreateFailed(message) => assert!(message.contains("Bad credentials")),
        other => panic!("expected CommitCreateFailed, got {:?}", other),
    }
    assert_eq!(store.reference(&slug(), "heads/main").await, Some(head));
}

/// Store wrapper that moves the reference while the commit is being created,
/// as a concurrent writer would
#[derive(Debug)]
struct RacingStore {
    inner: MemoryObjectStore,
}

#[async_trait]
impl ObjectStore for RacingStore {
    async fn get_repository(&self, repo: &RepoSlug) -> ProtocolResult<RepositoryInfo> {
        self.inner.get_repository(repo).await
    }

    async fn get_reference(&self, repo: &RepoSlug, ref_name: &str) -> ProtocolResult<ReferenceInfo> {
        self.inner.get_reference(repo, ref_name).await
    }

    async fn create_blob(&self, repo: &RepoSlug, body: BlobBody) -> ProtocolResult<CreatedObject> {
        self.inner.create_blob(repo, body).await
    }

    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTreeRequest,
    ) -> ProtocolResult<CreatedObject> {
        self.inner.create_tree(repo, request).await
    }

    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommitRequest,
    ) -> ProtocolResult<CreatedObject> {
        let created = self.inner.create_commit(repo, request).await?;
        self.inner.advance_reference(repo, "heads/main").await?;
        Ok(created)
    }

    async fn update_reference(
        &self,
        repo: &RepoSlug,
        ref_name: &str,
        request: &UpdateRefRequest,
    ) -> ProtocolResult<RefUpdateOutcome> {
        self.inner.update_reference(repo, ref_name, request).await
    }
}

#[tokio::test]
async fn test_concurrent_move_is_non_fast_forward() {
    let (store, _) = store_with_repo().await;
    let workspace = TestWorkspace::new();
    workspace.write_file("a.txt", b"a");

    let racing = RacingStore {
        inner: store.clone(),
    };
    let err = CommitPipeline::new(Arc::new(racing))
        .run(request(&workspace, "a.txt"))
        .await
        .unwrap_err();

    match err {
        GraphError::NonFastForward { reference, reason } => {
            assert_eq!(reference, "heads/main");
            assert!(reason.contains("fast forward"));
        }
        other => panic!("expected NonFastForward, got {:?}", other),
    }

    // The concurrent writer's commit stays in place
    let head = store.reference(&slug(), "heads/main").await.unwrap();
    assert_eq!(store.commit(&slug(), &head).await.unwrap().message, "Concurrent update");
}
