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

//! GitHub Git data API client
//!
//! Implements [`ObjectStore`] over the REST endpoints under
//! `/repos/{owner}/{repo}/git/`. Responses are classified by status:
//!
//! | Status      | Result                                   |
//! |-------------|------------------------------------------|
//! | 2xx         | parsed body                              |
//! | 401, 403    | [`ProtocolError::Unauthorized`]          |
//! | 404         | [`ProtocolError::NotFound`]              |
//! | 409, 422    | [`ProtocolError::Rejected`]              |
//! | other       | [`ProtocolError::UnexpectedStatus`]      |
//!
//! A 409 or 422 on a reference update becomes
//! [`RefUpdateOutcome::Rejected`] instead.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{ProtocolError, ProtocolResult};
use crate::store::ObjectStore;
use crate::streaming::BlobBody;
use crate::types::{
    ApiErrorBody, CreateCommitRequest, CreateTreeRequest, CreatedObject, GitCommitResponse,
    GitRefResponse, GitTagResponse, ObjectType, RefUpdateOutcome, ReferenceInfo, RepoSlug,
    RepositoryInfo, UpdateRefRequest,
};

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version sent with every request
pub const API_VERSION: &str = "2022-11-28";

/// Annotated tags pointing at tags are followed at most this many times
const MAX_TAG_DEPTH: usize = 8;

/// Longest error text kept from a non-JSON error body
const MAX_ERROR_TEXT: usize = 200;

/// Connection settings for [`GitHubClient`]
#[derive(Clone)]
pub struct ClientOptions {
    /// API root, without trailing slash
    pub api_url: String,
    /// Bearer token; requests are anonymous without one
    pub token: Option<String>,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Limit for metadata requests; blob uploads only bound the connect phase
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: format!("treecommit/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the GitHub Git data API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_url: String,
    client: Client,
    timeout: Duration,
}

impl GitHubClient {
    /// Build a client
    ///
    /// # Errors
    ///
    /// Fails when the token or user agent is not a valid header value, or
    /// the TLS backend cannot be initialized.
    pub fn new(options: ClientOptions) -> ProtocolResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        if let Some(token) = options.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ProtocolError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(options.user_agent)
            .default_headers(headers)
            .connect_timeout(options.timeout)
            .build()?;

        Ok(Self {
            api_url: options.api_url.trim_end_matches('/').to_string(),
            client,
            timeout: options.timeout,
        })
    }

    /// API root this client talks to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn repo_url(&self, repo: &RepoSlug, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.name)
        } else {
            format!("{}/repos/{}/{}/{}", self.api_url, repo.owner, repo.name, path)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> ProtocolResult<T> {
        debug!(url, "GET");
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        parse_json(check_status(response, resource).await?, resource).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B, resource: &str) -> ProtocolResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        parse_json(check_status(response, resource).await?, resource).await
    }

    async fn send_blob(&self, request: RequestBuilder, body: BlobBody) -> ProtocolResult<Response> {
        let path = body.path().to_path_buf();
        let content_length = body.content_length();
        let (stream, failure) = body.into_parts();

        let result = request
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, content_length)
            .body(Body::wrap_stream(stream))
            .send()
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(err) => match failure.take() {
                Some(source) => Err(ProtocolError::FileUnreadable { path, source }),
                None => Err(ProtocolError::Transport(err)),
            },
        }
    }
}

#[async_trait]
impl ObjectStore for GitHubClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_repository(&self, repo: &RepoSlug) -> ProtocolResult<RepositoryInfo> {
        let resource = format!("repository {}", repo);
        self.get_json(&self.repo_url(repo, ""), &resource).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_reference(
        &self,
        repo: &RepoSlug,
        ref_name: &str,
    ) -> ProtocolResult<ReferenceInfo> {
        let resource = format!("reference {}", ref_name);
        let url = self.repo_url(repo, &format!("git/ref/{}", encode_ref_path(ref_name)));
        let reference: GitRefResponse = self.get_json(&url, &resource).await?;

        let mut target = reference.object;
        for _ in 0..MAX_TAG_DEPTH {
            if target.kind != ObjectType::Tag {
                break;
            }
            let url = self.repo_url(repo, &format!("git/tags/{}", target.sha));
            let tag: GitTagResponse = self.get_json(&url, &format!("tag {}", target.sha)).await?;
            target = tag.object;
        }

        if target.kind != ObjectType::Commit {
            return Err(ProtocolError::InvalidResponse {
                resource,
                message: format!("reference points at a {:?}, not a commit", target.kind),
            });
        }

        let url = self.repo_url(repo, &format!("git/commits/{}", target.sha));
        let commit: GitCommitResponse = self
            .get_json(&url, &format!("commit {}", target.sha))
            .await?;

        debug!(commit = %target.sha, tree = %commit.tree.sha, "Resolved reference");

        Ok(ReferenceInfo {
            name: ref_name.to_string(),
            commit_sha: target.sha,
            tree_sha: commit.tree.sha,
        })
    }

    #[instrument(skip(self, body), fields(repo = %repo))]
    async fn create_blob(&self, repo: &RepoSlug, body: BlobBody) -> ProtocolResult<CreatedObject> {
        let url = self.repo_url(repo, "git/blobs");
        debug!(
            url,
            path = %body.path().display(),
            content_length = body.content_length(),
            "POST (streamed)"
        );

        let response = self.send_blob(self.client.post(&url), body).await?;
        parse_json(check_status(response, "blob upload").await?, "blob upload").await
    }

    #[instrument(skip(self, request), fields(repo = %repo))]
    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTreeRequest,
    ) -> ProtocolResult<CreatedObject> {
        let url = self.repo_url(repo, "git/trees");
        self.post_json(&url, request, "tree creation").await
    }

    #[instrument(skip(self, request), fields(repo = %repo))]
    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommitRequest,
    ) -> ProtocolResult<CreatedObject> {
        let url = self.repo_url(repo, "git/commits");
        self.post_json(&url, request, "commit creation").await
    }

    #[instrument(skip(self, request), fields(repo = %repo))]
    async fn update_reference(
        &self,
        repo: &RepoSlug,
        ref_name: &str,
        request: &UpdateRefRequest,
    ) -> ProtocolResult<RefUpdateOutcome> {
        let url = self.repo_url(repo, &format!("git/refs/{}", encode_ref_path(ref_name)));
        debug!(url, "PATCH");

        let response = self
            .client
            .patch(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let reason = error_message(response).await;
            debug!(status = status.as_u16(), %reason, "Reference update refused");
            return Ok(RefUpdateOutcome::Rejected { reason });
        }

        let resource = format!("reference {}", ref_name);
        let updated: GitRefResponse =
            parse_json(check_status(response, &resource).await?, &resource).await?;

        Ok(RefUpdateOutcome::Updated {
            sha: updated.object.sha,
        })
    }
}

/// Pass successful responses through, classify the rest
async fn check_status(response: Response, resource: &str) -> ProtocolResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let resource = resource.to_string();
    let message = error_message(response).await;

    Err(match status {
        StatusCode::NOT_FOUND => ProtocolError::NotFound { resource },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProtocolError::Unauthorized {
            resource,
            status: code,
            message,
        },
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ProtocolError::Rejected {
            resource,
            status: code,
            message,
        },
        _ => ProtocolError::UnexpectedStatus {
            resource,
            status: code,
            message,
        },
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response, resource: &str) -> ProtocolResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProtocolError::InvalidResponse {
        resource: resource.to_string(),
        message: e.to_string(),
    })
}

/// The `message` of a GitHub error document, or the start of the raw body
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&text) {
        return body.message;
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("no message").to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_TEXT).collect()
    }
}

/// Percent-encode characters that would change the meaning of a URL path,
/// keeping `/` so `heads/feature/x` stays hierarchical
pub fn encode_ref_path(ref_name: &str) -> String {
    let mut out = String::with_capacity(ref_name.len());
    for byte in ref_name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
