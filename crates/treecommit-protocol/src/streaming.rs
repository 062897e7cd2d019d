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

//! Streaming blob request bodies
//!
//! Creating a blob takes a JSON document holding the file's bytes in base64:
//!
//! ```text
//! {"encoding":"base64","content":"SGFsZiBtZWFzdXJlcyBhcmUgYXMgYmFkIGFzIG5vdGhpbmcgYXQgYWxsLg=="}
//! ```
//!
//! Building that document in memory would cost roughly 2.3x the file size.
//! [`StreamingBlobEncoder`] instead produces it as a lazy stream: a literal
//! prefix, the file encoded one chunk at a time, and a literal suffix. Memory
//! use stays proportional to the chunk size whatever the file size.
//!
//! Base64 works on 3-byte groups, and a read boundary can split a group. The
//! encoder carries at most two bytes from one read to the next and flushes
//! them, padded, at end of file, so the concatenated output equals encoding
//! the whole file at once.
//!
//! # Example
//!
//! ```rust,no_run
//! use treecommit_protocol::streaming::StreamingBlobEncoder;
//!
//! # async fn example() -> treecommit_protocol::ProtocolResult<()> {
//! let encoder = StreamingBlobEncoder::open("assets/video.mp4", 64 * 1024).await?;
//! println!("request body will be {} bytes", encoder.content_length());
//! let body = encoder.into_body();
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use futures::future::ready;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult};

/// Literal start of the blob document
pub const BODY_PREFIX: &[u8] = br#"{"encoding":"base64","content":""#;

/// Literal end of the blob document
pub const BODY_SUFFIX: &[u8] = br#""}"#;

/// Default bytes read per step
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Exact size of the blob document for a file of `file_size` bytes
pub fn content_length(file_size: u64) -> u64 {
    BODY_PREFIX.len() as u64 + file_size.div_ceil(3) * 4 + BODY_SUFFIX.len() as u64
}

/// Incremental base64 encoder holding back an incomplete trailing group
#[derive(Debug, Default)]
pub struct Base64Carry {
    pending: [u8; 2],
    len: usize,
}

impl Base64Carry {
    /// Create an encoder with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently held back (0, 1 or 2)
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Encode every complete 3-byte group available after appending `input`,
    /// holding back the remainder
    pub fn push(&mut self, mut input: &[u8]) -> String {
        let mut out = String::with_capacity((self.len + input.len()) / 3 * 4);

        if self.len > 0 {
            let need = 3 - self.len;
            if input.len() < need {
                self.pending[self.len..self.len + input.len()].copy_from_slice(input);
                self.len += input.len();
                return out;
            }

            let mut group = [0u8; 3];
            group[..self.len].copy_from_slice(&self.pending[..self.len]);
            group[self.len..].copy_from_slice(&input[..need]);
            STANDARD.encode_string(group, &mut out);
            input = &input[need..];
            self.len = 0;
        }

        let whole = input.len() - input.len() % 3;
        STANDARD.encode_string(&input[..whole], &mut out);

        let rest = &input[whole..];
        self.pending[..rest.len()].copy_from_slice(rest);
        self.len = rest.len();

        out
    }

    /// Encode whatever is held back, with padding
    pub fn finish(self) -> String {
        STANDARD.encode(&self.pending[..self.len])
    }
}

/// Slot recording the I/O error that aborted a body stream
///
/// HTTP clients wrap body errors in their own error types; the slot lets the
/// uploader recover the original failure and report it as
/// [`ProtocolError::FileUnreadable`].
#[derive(Debug, Clone, Default)]
pub struct ReadFailure(Arc<Mutex<Option<io::Error>>>);

impl ReadFailure {
    fn record(&self, error: io::Error) -> io::Error {
        let echo = io::Error::new(error.kind(), error.to_string());
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(error);
        }
        echo
    }

    /// Take the recorded error, if the stream failed
    pub fn take(&self) -> Option<io::Error> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Opens one file and turns it into a streamed blob request body
#[derive(Debug)]
pub struct StreamingBlobEncoder {
    path: PathBuf,
    file: File,
    file_size: u64,
    chunk_size: usize,
}

impl StreamingBlobEncoder {
    /// Open `path` for streaming
    ///
    /// A `chunk_size` of zero falls back to [`DEFAULT_CHUNK_SIZE`].
    pub async fn open(path: impl AsRef<Path>, chunk_size: usize) -> ProtocolResult<Self> {
        let path = path.as_ref().to_path_buf();
        let unreadable = |source| ProtocolError::FileUnreadable {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).await.map_err(unreadable)?;
        let file_size = file.metadata().await.map_err(unreadable)?.len();

        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };

        debug!(
            path = %path.display(),
            file_size,
            chunk_size,
            "Opened file for blob streaming"
        );

        Ok(Self {
            path,
            file,
            file_size,
            chunk_size,
        })
    }

    /// File being encoded
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file when it was opened
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Exact size of the request body
    pub fn content_length(&self) -> u64 {
        content_length(self.file_size)
    }

    /// Consume the encoder, producing the lazy request body
    pub fn into_body(self) -> BlobBody {
        let failure = ReadFailure::default();
        let content_length = self.content_length();
        let stream =
            encode_file(self.file, self.file_size, self.chunk_size, failure.clone()).boxed();

        BlobBody {
            path: self.path,
            content_length,
            stream,
            failure,
        }
    }
}

/// A single-pass blob request body
///
/// The file handle lives inside the stream and is closed when the stream
/// finishes, fails or is dropped. The file must keep the size it had when it
/// was opened: growing or shrinking it mid-upload fails the stream with an
/// [`io::ErrorKind::InvalidData`] error, reported by uploaders as
/// [`ProtocolError::FileUnreadable`].
pub struct BlobBody {
    path: PathBuf,
    content_length: u64,
    stream: BoxStream<'static, io::Result<Bytes>>,
    failure: ReadFailure,
}

impl std::fmt::Debug for BlobBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobBody")
            .field("path", &self.path)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl BlobBody {
    /// File the body is read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact body size, computed when the file was opened
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Split into the byte stream and its failure slot
    pub fn into_parts(self) -> (BoxStream<'static, io::Result<Bytes>>, ReadFailure) {
        (self.stream, self.failure)
    }

    /// Drain the stream into memory
    ///
    /// For consumers that need the whole document, such as in-process fakes
    /// and tests. A read error mid-stream discards the partial output.
    pub async fn collect(self) -> ProtocolResult<Vec<u8>> {
        let BlobBody { path, mut stream, .. } = self;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| ProtocolError::FileUnreadable {
                path: path.clone(),
                source,
            })?;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

/// Prefix, encoded file, suffix, as one stream
fn encode_file(
    file: File,
    file_size: u64,
    chunk_size: usize,
    failure: ReadFailure,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::once(ready(Ok(Bytes::from_static(BODY_PREFIX))))
        .chain(encode_content(file, file_size, chunk_size, failure))
        .chain(stream::once(ready(Ok(Bytes::from_static(BODY_SUFFIX)))))
}

fn size_changed(expected: u64, read: u64) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "file changed size during upload: opened at {} bytes, read {}",
            expected, read
        ),
    ))
}

// The file must yield exactly `file_size` bytes, or the body would not match
// its Content-Length
fn encode_content(
    mut file: File,
    file_size: u64,
    chunk_size: usize,
    failure: ReadFailure,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    async_stream::try_stream! {
        let mut carry = Base64Carry::new();
        let mut buf = vec![0u8; chunk_size];
        let mut total: u64 = 0;

        loop {
            let read: usize = file.read(&mut buf).await.map_err(|e| failure.record(e))?;
            if read == 0 {
                break;
            }
            total += read as u64;
            if total > file_size {
                size_changed(file_size, total).map_err(|e| failure.record(e))?;
            }
            let encoded = carry.push(&buf[..read]);
            if !encoded.is_empty() {
                yield Bytes::from(encoded);
            }
        }
        if total != file_size {
            size_changed(file_size, total).map_err(|e| failure.record(e))?;
        }

        let tail = carry.finish();
        if !tail.is_empty() {
            yield Bytes::from(tail);
        }
    }
}
