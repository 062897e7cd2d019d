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

// Integration tests for the streaming blob encoder
// These tests check the streamed document against whole-file encoding

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::StreamExt;
use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use treecommit_protocol::streaming::{content_length, BODY_PREFIX, BODY_SUFFIX};
use treecommit_protocol::{CreateBlobRequest, ProtocolError, StreamingBlobEncoder};

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

async fn stream_document(path: &Path, chunk_size: usize) -> Vec<u8> {
    StreamingBlobEncoder::open(path, chunk_size)
        .await
        .unwrap()
        .into_body()
        .collect()
        .await
        .unwrap()
}

fn expected_document(data: &[u8]) -> Vec<u8> {
    format!(
        r#"{{"encoding":"base64","content":"{}"}}"#,
        STANDARD.encode(data)
    )
    .into_bytes()
}

#[tokio::test]
async fn test_document_matches_whole_file_encoding() {
    let dir = TempDir::new().unwrap();

    for len in [0usize, 1, 2, 3, 4096, 1 << 20] {
        let data = sample_bytes(len);
        let path = write_file(&dir, &format!("file-{}.bin", len), &data);

        let document = stream_document(&path, 64 * 1024).await;
        assert_eq!(document, expected_document(&data), "size {}", len);
        assert_eq!(document.len() as u64, content_length(len as u64));
    }
}

#[tokio::test]
async fn test_odd_chunk_sizes_split_groups() {
    let dir = TempDir::new().unwrap();
    let data = sample_bytes(1000);
    let path = write_file(&dir, "odd.bin", &data);

    for chunk_size in [1usize, 2, 4, 5, 7, 999, 1001] {
        let document = stream_document(&path, chunk_size).await;
        assert_eq!(document, expected_document(&data), "chunk {}", chunk_size);
    }
}

#[tokio::test]
async fn test_empty_file_document_is_exact() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "empty", b"");

    let document = stream_document(&path, 16).await;
    assert_eq!(document, br#"{"encoding":"base64","content":""}"#.to_vec());
}

#[tokio::test]
async fn test_document_parses_as_blob_request() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "hi.txt", b"hi");

    let document = stream_document(&path, 1).await;
    let parsed: CreateBlobRequest = serde_json::from_slice(&document).unwrap();
    assert_eq!(parsed.encoding, "base64");
    assert_eq!(parsed.content, "aGk=");
}

#[tokio::test]
async fn test_stream_starts_with_prefix_and_ends_with_suffix() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "abc.txt", b"abcdef");

    let body = StreamingBlobEncoder::open(&path, 2).await.unwrap().into_body();
    assert_eq!(body.path(), path.as_path());

    let (stream, failure) = body.into_parts();
    let chunks: Vec<_> = stream.map(|chunk| chunk.unwrap()).collect().await;

    assert_eq!(chunks.first().unwrap().as_ref(), BODY_PREFIX);
    assert_eq!(chunks.last().unwrap().as_ref(), BODY_SUFFIX);
    assert!(failure.take().is_none());
}

#[tokio::test]
async fn test_encoder_reports_sizes() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "ten.bin", &sample_bytes(10));

    let encoder = StreamingBlobEncoder::open(&path, 0).await.unwrap();
    assert_eq!(encoder.file_size(), 10);
    assert_eq!(encoder.path(), path.as_path());
    assert_eq!(
        encoder.content_length(),
        (BODY_PREFIX.len() + 16 + BODY_SUFFIX.len()) as u64
    );
}

#[tokio::test]
async fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.txt");

    match StreamingBlobEncoder::open(&missing, 16).await {
        Err(ProtocolError::FileUnreadable { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected FileUnreadable, got {:?}", other),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_directory_is_unreadable() {
    let dir = TempDir::new().unwrap();

    // Opening a directory succeeds on unix; reading it fails mid-stream.
    let result = match StreamingBlobEncoder::open(dir.path(), 16).await {
        Ok(encoder) => encoder.into_body().collect().await,
        Err(err) => Err(err),
    };
    assert!(matches!(result, Err(ProtocolError::FileUnreadable { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_streamed_document_matches(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        chunk_size in 1usize..97,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "prop.bin", &data);

        let document = runtime.block_on(stream_document(&path, chunk_size));
        prop_assert_eq!(document.len() as u64, content_length(data.len() as u64));
        prop_assert_eq!(document, expected_document(&data));
    }
}
