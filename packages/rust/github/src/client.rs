//! Authenticated GitHub REST client.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, LAST_MODIFIED};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use wishlist_shared::{ChangeEvent, Credentials, RepoRef, Result, SourceFile, WishlistError};

use crate::lines::LineSource;

/// User-Agent string for API and download requests.
const USER_AGENT: &str = concat!("wishlist-compiler/", env!("CARGO_PKG_VERSION"));

/// Media type GitHub recommends for REST v3 requests.
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Page size for commit and commit-file listings (GitHub's maximum).
const PER_PAGE: usize = 100;

/// Maximum number of redirects to follow on raw downloads.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<Url>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitListItem {
    sha: String,
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    sha: String,
    commit: CommitInfo,
    #[serde(default)]
    files: Vec<CommitFile>,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    author: Option<Signature>,
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
}

impl CommitInfo {
    /// Author date, falling back to committer date.
    fn timestamp(&self, sha: &str) -> Result<DateTime<Utc>> {
        self.author
            .as_ref()
            .or(self.committer.as_ref())
            .map(|s| s.date)
            .ok_or_else(|| WishlistError::RemoteAccess(format!("commit {sha} has no author date")))
    }
}

/// A commit identifier with its author timestamp, as returned by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

/// GitHub REST client authenticated with an account identifier and token.
pub struct GitHubClient {
    http: Client,
    api_base: Url,
    credentials: Credentials,
}

impl GitHubClient {
    /// Create a client rooted at `api_base` (e.g. `https://api.github.com`).
    pub fn new(api_base: Url, credentials: Credentials) -> Result<Self> {
        if api_base.cannot_be_a_base() {
            return Err(WishlistError::validation(format!(
                "API base URL cannot carry a path: {api_base}"
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| {
                WishlistError::RemoteAccess(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            api_base,
            credentials,
        })
    }

    /// List the files directly under `path` in `repo`.
    ///
    /// Entries that are not regular files are skipped.
    #[instrument(skip_all, fields(repo = %repo, path = %path))]
    pub async fn list_directory(&self, repo: &RepoRef, path: &str) -> Result<Vec<SourceFile>> {
        let url = self.contents_url(repo, path)?;
        let response = self
            .send(self.api_get(url.clone()))
            .await
            .map_err(WishlistError::RemoteAccess)?;
        let listing: ContentsResponse = json_body(response, &url)
            .await
            .map_err(WishlistError::RemoteAccess)?;

        let entries = match listing {
            ContentsResponse::Directory(entries) => entries,
            ContentsResponse::File(entry) => vec![entry],
        };

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.kind != "file" {
                debug!(name = %entry.name, kind = %entry.kind, "skipping non-file entry");
                continue;
            }
            files.push(into_source_file(entry, None)?);
        }

        debug!(count = files.len(), "listed directory");
        Ok(files)
    }

    /// Fetch a single file record, including inline content and the
    /// `Last-Modified` response header.
    #[instrument(skip_all, fields(repo = %repo, path = %path))]
    pub async fn fetch_file(&self, repo: &RepoRef, path: &str) -> Result<SourceFile> {
        let url = self.contents_url(repo, path)?;
        let response = self
            .send(self.api_get(url.clone()))
            .await
            .map_err(|m| WishlistError::fetch(path, m))?;

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc));

        match json_body(response, &url)
            .await
            .map_err(|m| WishlistError::fetch(path, m))?
        {
            ContentsResponse::File(entry) if entry.kind == "file" => {
                into_source_file(entry, last_modified)
            }
            _ => Err(WishlistError::fetch(path, "path is not a regular file")),
        }
    }

    /// List every commit in `repo`, optionally restricted to those touching `path`.
    ///
    /// Returned in API order (newest first).
    #[instrument(skip_all, fields(repo = %repo, path = ?path))]
    pub async fn list_commits(
        &self,
        repo: &RepoRef,
        path: Option<&str>,
    ) -> Result<Vec<CommitSummary>> {
        let mut commits = Vec::new();
        let mut page = 1usize;

        loop {
            let mut url = self.endpoint(["repos", repo.owner.as_str(), repo.name.as_str(), "commits"])?;
            {
                let mut query = url.query_pairs_mut();
                if let Some(path) = path.filter(|p| !p.is_empty()) {
                    query.append_pair("path", path);
                }
                query
                    .append_pair("per_page", &PER_PAGE.to_string())
                    .append_pair("page", &page.to_string());
            }

            let response = self
                .send(self.api_get(url.clone()))
                .await
                .map_err(WishlistError::RemoteAccess)?;
            let items: Vec<CommitListItem> = json_body(response, &url)
                .await
                .map_err(WishlistError::RemoteAccess)?;

            let page_len = items.len();
            for item in items {
                let timestamp = item.commit.timestamp(&item.sha)?;
                commits.push(CommitSummary {
                    sha: item.sha,
                    timestamp,
                });
            }

            debug!(page, page_len, "listed commit page");
            if page_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    /// Fetch one commit and the set of paths it touched.
    ///
    /// Large commits list their files across several pages; every page is read.
    #[instrument(skip_all, fields(repo = %repo, sha = %sha))]
    pub async fn commit_detail(&self, repo: &RepoRef, sha: &str) -> Result<ChangeEvent> {
        let mut paths = BTreeSet::new();
        let mut first: Option<(String, DateTime<Utc>)> = None;
        let mut page = 1usize;

        loop {
            let mut url =
                self.endpoint(["repos", repo.owner.as_str(), repo.name.as_str(), "commits", sha])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self
                .send(self.api_get(url.clone()))
                .await
                .map_err(WishlistError::RemoteAccess)?;
            let detail: CommitDetail = json_body(response, &url)
                .await
                .map_err(WishlistError::RemoteAccess)?;

            if first.is_none() {
                let timestamp = detail.commit.timestamp(&detail.sha)?;
                first = Some((detail.sha, timestamp));
            }

            let page_len = detail.files.len();
            paths.extend(detail.files.into_iter().map(|f| f.filename));

            debug!(page, page_len, "listed commit files");
            if page_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        let (id, timestamp) = first.ok_or_else(|| {
            WishlistError::RemoteAccess(format!("commit {sha} returned no detail"))
        })?;

        Ok(ChangeEvent {
            id,
            timestamp,
            paths,
        })
    }

    /// Open the lines of a file: inline content when present, otherwise a
    /// streamed download of its raw URL.
    pub async fn open_lines(&self, file: &SourceFile) -> Result<LineSource> {
        if let Some(bytes) = file.inline_content() {
            return Ok(LineSource::from_bytes(file.path.clone(), bytes.to_vec()));
        }

        let url = file.download_url.clone().ok_or_else(|| {
            WishlistError::fetch(&file.path, "no inline content and no download URL")
        })?;

        debug!(path = %file.path, %url, "streaming raw content");

        // Raw URLs may live on another host; credentials stay with the API.
        let response = self
            .send(self.http.get(url))
            .await
            .map_err(|m| WishlistError::fetch(&file.path, m))?;

        Ok(LineSource::from_response(file.path.clone(), response))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Build an API URL from path segments; each segment is percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| WishlistError::validation("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, repo: &RepoRef, path: &str) -> Result<Url> {
        let segments = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));
        self.endpoint(segments)
    }

    fn api_get(&self, url: Url) -> RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .header(ACCEPT, GITHUB_JSON)
    }

    /// Send a request and require a success status.
    async fn send(&self, request: RequestBuilder) -> std::result::Result<Response, String> {
        let response = request.send().await.map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{}: HTTP {status}", response.url()));
        }

        Ok(response)
    }
}

async fn json_body<T: DeserializeOwned>(
    response: Response,
    url: &Url,
) -> std::result::Result<T, String> {
    response
        .json()
        .await
        .map_err(|e| format!("{url}: invalid response body: {e}"))
}

fn into_source_file(
    entry: ContentEntry,
    last_modified: Option<DateTime<Utc>>,
) -> Result<SourceFile> {
    let content = match (entry.content.as_deref(), entry.encoding.as_deref()) {
        (Some(encoded), Some("base64")) => Some(decode_base64(&entry.path, encoded)?),
        (Some(text), None | Some("utf-8")) => Some(text.as_bytes().to_vec()),
        _ => None,
    };

    Ok(SourceFile {
        name: entry.name,
        path: entry.path,
        content,
        download_url: entry.download_url,
        last_modified,
    })
}

/// Decode GitHub's line-wrapped base64 payload.
fn decode_base64(path: &str, encoded: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| WishlistError::fetch(path, format!("invalid base64 content: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepoRef {
        RepoRef::new("owner", "lists")
    }

    fn client_for(server: &MockServer) -> GitHubClient {
        let creds = Credentials {
            username: "someone".into(),
            token: "secret".into(),
        };
        GitHubClient::new(Url::parse(&server.uri()).unwrap(), creds).unwrap()
    }

    fn commit_json(sha: &str, date: &str) -> serde_json::Value {
        json!({ "sha": sha, "commit": { "author": { "date": date }, "committer": { "date": date } } })
    }

    #[test]
    fn decode_base64_ignores_wrapping() {
        // "title:x\ndescription:y\n" wrapped across lines.
        let encoded = "dGl0bGU6eApk\nZXNjcmlwdGlv\nbjp5Cg==\n";
        let decoded = decode_base64("a.txt", encoded).unwrap();
        assert_eq!(decoded, b"title:x\ndescription:y\n");
    }

    #[test]
    fn decode_base64_rejects_garbage() {
        let err = decode_base64("a.txt", "!!!not base64!!!").unwrap_err();
        assert!(matches!(err, WishlistError::Fetch { .. }));
    }

    #[tokio::test]
    async fn list_directory_returns_files_only() {
        let server = MockServer::start().await;
        let download = format!("{}/raw/PandaPaxxy/b.txt", server.uri());

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/contents/PandaPaxxy"))
            .and(basic_auth("someone", "secret"))
            .and(header("accept", GITHUB_JSON))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "a.txt", "path": "PandaPaxxy/a.txt", "type": "file",
                  "download_url": null, "content": "dGl0bGU6YQo=", "encoding": "base64" },
                { "name": "b.txt", "path": "PandaPaxxy/b.txt", "type": "file",
                  "download_url": download },
                { "name": "old", "path": "PandaPaxxy/old", "type": "dir", "download_url": null }
            ])))
            .mount(&server)
            .await;

        let files = client_for(&server)
            .list_directory(&repo(), "PandaPaxxy")
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.txt");
        assert_eq!(files[0].content.as_deref(), Some(&b"title:a\n"[..]));
        assert_eq!(files[1].path, "PandaPaxxy/b.txt");
        assert!(files[1].content.is_none());
        assert_eq!(files[1].download_url.as_ref().map(Url::as_str), Some(download.as_str()));
    }

    #[tokio::test]
    async fn list_directory_failure_is_remote_access_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/contents/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .list_directory(&repo(), "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, WishlistError::RemoteAccess(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn fetch_file_reads_last_modified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/contents/dir/a.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Last-Modified", "Tue, 05 Mar 2024 10:15:00 GMT")
                    .set_body_json(json!({
                        "name": "a.txt", "path": "dir/a.txt", "type": "file",
                        "download_url": null, "content": "dGl0bGU6YQo=", "encoding": "base64"
                    })),
            )
            .mount(&server)
            .await;

        let file = client_for(&server).fetch_file(&repo(), "dir/a.txt").await.unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-05T10:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(file.last_modified, Some(expected));
        assert_eq!(file.inline_content(), Some(&b"title:a\n"[..]));
    }

    #[tokio::test]
    async fn list_commits_follows_pages() {
        let server = MockServer::start().await;

        let first_page: Vec<_> = (0..PER_PAGE)
            .map(|i| commit_json(&format!("p1-{i}"), "2024-02-01T00:00:00Z"))
            .collect();

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/commits"))
            .and(query_param("path", "dir"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/commits"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([commit_json("last", "2023-01-01T00:00:00Z")])),
            )
            .mount(&server)
            .await;

        let commits = client_for(&server)
            .list_commits(&repo(), Some("dir"))
            .await
            .unwrap();

        assert_eq!(commits.len(), PER_PAGE + 1);
        assert_eq!(commits[0].sha, "p1-0");
        assert_eq!(commits.last().unwrap().sha, "last");
    }

    #[tokio::test]
    async fn commit_detail_collects_paths() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/commits/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "abc123",
                "commit": { "author": { "date": "2024-01-10T12:00:00Z" } },
                "files": [ { "filename": "dir/b.txt" }, { "filename": "dir/a.txt" } ]
            })))
            .mount(&server)
            .await;

        let event = client_for(&server)
            .commit_detail(&repo(), "abc123")
            .await
            .unwrap();

        assert_eq!(event.id, "abc123");
        assert_eq!(
            event.paths.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["dir/a.txt", "dir/b.txt"]
        );
    }

    #[tokio::test]
    async fn commit_detail_reads_every_file_page() {
        let server = MockServer::start().await;

        let first_page: Vec<_> = (0..PER_PAGE)
            .map(|i| json!({ "filename": format!("PandaPaxxy/bulk_{i:03}.txt") }))
            .collect();

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/commits/big"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "big",
                "commit": { "author": { "date": "2024-01-10T12:00:00Z" } },
                "files": first_page
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/lists/commits/big"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "big",
                "commit": { "author": { "date": "2024-01-10T12:00:00Z" } },
                "files": [ { "filename": "PandaPaxxy/a.txt" } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let event = client_for(&server)
            .commit_detail(&repo(), "big")
            .await
            .unwrap();

        assert_eq!(event.id, "big");
        assert_eq!(event.paths.len(), PER_PAGE + 1);
        assert!(event.paths.contains("PandaPaxxy/a.txt"));
        assert!(event.paths.contains("PandaPaxxy/bulk_000.txt"));
    }

    #[tokio::test]
    async fn open_lines_without_any_source_is_fetch_error() {
        let server = MockServer::start().await;
        let file = SourceFile::new("a.txt", "dir/a.txt");

        let err = client_for(&server).open_lines(&file).await.unwrap_err();
        assert!(matches!(err, WishlistError::Fetch { .. }));
    }

    #[tokio::test]
    async fn open_lines_download_failure_is_fetch_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/raw/dir/a.txt"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut file = SourceFile::new("a.txt", "dir/a.txt");
        file.download_url = Some(Url::parse(&format!("{}/raw/dir/a.txt", server.uri())).unwrap());

        let err = client_for(&server).open_lines(&file).await.unwrap_err();
        assert!(matches!(err, WishlistError::Fetch { .. }));
    }
}
