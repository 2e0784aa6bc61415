//! DFS REST client
//!
//! Implements the PathStore trait against the DFS endpoint dialect
//! (api-version 2018-11-09): filesystems as containers, slash-delimited
//! paths, append/flush two-phase writes, and continuation tokens carried in
//! the x-ms-continuation header.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt as _;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use serde::{Deserialize, Deserializer};
use tokio::sync::RwLock;
use url::Url;

use dlk_core::{
    AccessControlUpdate, BearerToken, ByteStream, Error, FilesystemItem, Headers,
    ListFilesystemsOptions, ListPathsOptions, Page, PathItem, PathStore, RemotePath, ResourceType,
    Result, TokenProvider, STORAGE_SCOPE,
};

/// REST api-version sent with every request
pub const API_VERSION: &str = "2018-11-09";

/// Response header carrying the listing continuation token
const CONTINUATION_HEADER: &str = "x-ms-continuation";

/// Refresh the cached token this many seconds before it expires
const TOKEN_REFRESH_SKEW_SECS: i64 = 60;

/// Client for one storage account's DFS endpoint
pub struct DfsClient {
    http: reqwest::Client,
    base_url: Url,
    provider: Arc<dyn TokenProvider>,
    token: RwLock<Option<BearerToken>>,
}

impl DfsClient {
    /// Create a client for `https://{account}.{dns_suffix}`
    pub fn new(
        account: impl Into<String>,
        dns_suffix: impl Into<String>,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let account = account.into();
        let dns_suffix = dns_suffix.into();
        if account.is_empty() {
            return Err(Error::Config("Storage account name is required".into()));
        }
        let base_url = Url::parse(&format!("https://{account}.{dns_suffix}"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            provider,
            token: RwLock::new(None),
        })
    }

    /// Fully qualified URL of a path, for display and property records
    pub fn url_for(&self, path: &RemotePath) -> String {
        self.path_url(path).to_string()
    }

    fn account_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/");
        url
    }

    fn filesystem_url(&self, filesystem: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/{}", urlencoding::encode(filesystem)));
        url
    }

    /// URL of a path; the filesystem root keeps a trailing slash so the
    /// request still targets the path endpoint family
    fn path_url(&self, path: &RemotePath) -> Url {
        let mut encoded = format!("/{}", urlencoding::encode(&path.filesystem));
        if path.path.is_empty() {
            encoded.push('/');
        } else {
            for segment in path.path.split('/') {
                encoded.push('/');
                encoded.push_str(&urlencoding::encode(segment));
            }
        }
        let mut url = self.base_url.clone();
        url.set_path(&encoded);
        url
    }

    /// Cached bearer token, refreshed when close to expiry
    async fn bearer(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(jiff::Timestamp::now(), TOKEN_REFRESH_SKEW_SECS) {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if token.is_fresh(jiff::Timestamp::now(), TOKEN_REFRESH_SKEW_SECS) {
                return Ok(token.token.clone());
            }
        }
        let fresh = self.provider.bearer_token(STORAGE_SCOPE).await?;
        let value = fresh.token.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    /// Attach auth headers, send, and surface non-2xx as typed errors
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.bearer().await?;
        let response = request
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("x-ms-version", API_VERSION)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(map_status(status.as_u16(), message))
    }
}

/// Map a non-2xx status and error body onto the error taxonomy
fn map_status(status: u16, message: String) -> Error {
    let message = if message.is_empty() {
        format!("HTTP {status} with no error body")
    } else {
        message
    };
    match status {
        401 | 403 => Error::Auth(message),
        404 => Error::NotFound(message),
        409 => Error::Conflict(message),
        _ => Error::Remote { status, message },
    }
}

/// Copy response headers into the transport-independent view
fn header_view(headers: &reqwest::header::HeaderMap) -> Headers {
    let mut view = Headers::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            view.insert(name.as_str(), value);
        }
    }
    view
}

fn continuation_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTINUATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// The service encodes booleans as strings in list bodies
fn de_lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }
    Ok(match Option::<BoolOrString>::deserialize(deserializer)? {
        None => false,
        Some(BoolOrString::Bool(b)) => b,
        Some(BoolOrString::String(s)) => s.eq_ignore_ascii_case("true"),
    })
}

/// Content lengths arrive as numbers or strings depending on service version
fn de_lenient_i64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(i64),
        String(String),
    }
    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        None => None,
        Some(NumOrString::Num(n)) => Some(n),
        Some(NumOrString::String(s)) => s.parse().ok(),
    })
}

#[derive(Debug, Deserialize)]
struct ListFilesystemsBody {
    #[serde(default)]
    filesystems: Vec<RawFilesystem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilesystem {
    name: String,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default, rename = "eTag")]
    e_tag: Option<String>,
}

impl From<RawFilesystem> for FilesystemItem {
    fn from(raw: RawFilesystem) -> Self {
        Self {
            name: raw.name,
            last_modified: raw.last_modified,
            etag: raw.e_tag,
            acl: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListPathsBody {
    #[serde(default)]
    paths: Vec<RawPath>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPath {
    name: String,
    #[serde(default, deserialize_with = "de_lenient_bool")]
    is_directory: bool,
    #[serde(default, deserialize_with = "de_lenient_i64")]
    content_length: Option<i64>,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    permissions: Option<String>,
    #[serde(default, rename = "eTag")]
    e_tag: Option<String>,
}

impl From<RawPath> for PathItem {
    fn from(raw: RawPath) -> Self {
        Self {
            name: raw.name,
            is_directory: raw.is_directory,
            content_length: raw.content_length,
            last_modified: raw.last_modified,
            owner: raw.owner,
            group: raw.group,
            permissions: raw.permissions,
            etag: raw.e_tag,
        }
    }
}

#[async_trait]
impl PathStore for DfsClient {
    async fn create_filesystem(&self, filesystem: &str) -> Result<()> {
        tracing::debug!(filesystem, "create filesystem");
        let request = self
            .http
            .put(self.filesystem_url(filesystem))
            .query(&[("resource", "filesystem")])
            .header(CONTENT_LENGTH, 0);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_filesystem(&self, filesystem: &str) -> Result<()> {
        tracing::debug!(filesystem, "delete filesystem");
        let request = self
            .http
            .delete(self.filesystem_url(filesystem))
            .query(&[("resource", "filesystem")]);
        self.send(request).await?;
        Ok(())
    }

    async fn list_filesystems(
        &self,
        options: ListFilesystemsOptions,
    ) -> Result<Page<FilesystemItem>> {
        let mut query: Vec<(&str, String)> = vec![("resource", "account".into())];
        if let Some(prefix) = options.prefix {
            query.push(("prefix", prefix));
        }
        if let Some(max) = options.max_results {
            query.push(("maxResults", max.to_string()));
        }
        if let Some(token) = options.continuation {
            query.push(("continuation", token));
        }

        let request = self.http.get(self.account_url()).query(&query);
        let response = self.send(request).await?;
        let continuation = continuation_of(&response);
        let body: ListFilesystemsBody = response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Page {
            items: body.filesystems.into_iter().map(Into::into).collect(),
            continuation,
        })
    }

    async fn create_path(&self, path: &RemotePath, resource: ResourceType) -> Result<()> {
        tracing::debug!(path = %path, resource = resource.as_str(), "create path");
        let request = self
            .http
            .put(self.path_url(path))
            .query(&[("resource", resource.as_str())])
            .header(CONTENT_LENGTH, 0);
        self.send(request).await?;
        Ok(())
    }

    async fn append(&self, path: &RemotePath, position: u64, data: Bytes) -> Result<()> {
        let request = self
            .http
            .patch(self.path_url(path))
            .query(&[("action", "append".to_string()), ("position", position.to_string())])
            .header(CONTENT_LENGTH, data.len())
            .body(data);
        self.send(request).await?;
        Ok(())
    }

    async fn flush(&self, path: &RemotePath, position: u64) -> Result<()> {
        let request = self
            .http
            .patch(self.path_url(path))
            .query(&[("action", "flush".to_string()), ("position", position.to_string())])
            .header(CONTENT_LENGTH, 0);
        self.send(request).await?;
        Ok(())
    }

    async fn read(&self, path: &RemotePath) -> Result<ByteStream> {
        let request = self.http.get(self.path_url(path));
        let response = self.send(request).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| Error::Network(e.to_string()));
        Ok(Box::pin(stream))
    }

    async fn list_paths(
        &self,
        filesystem: &str,
        options: ListPathsOptions,
    ) -> Result<Page<PathItem>> {
        let mut query: Vec<(&str, String)> = vec![
            ("resource", "filesystem".into()),
            ("recursive", options.recursive.to_string()),
        ];
        if let Some(directory) = options.directory.filter(|d| !d.is_empty()) {
            query.push(("directory", directory));
        }
        if let Some(max) = options.max_results {
            query.push(("maxResults", max.to_string()));
        }
        if let Some(token) = options.continuation {
            query.push(("continuation", token));
        }
        if options.upn {
            query.push(("upn", "true".into()));
        }

        let request = self.http.get(self.filesystem_url(filesystem)).query(&query);
        let response = self.send(request).await?;
        let continuation = continuation_of(&response);
        let body: ListPathsBody = response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Page {
            items: body.paths.into_iter().map(Into::into).collect(),
            continuation,
        })
    }

    async fn set_access_control(
        &self,
        path: &RemotePath,
        update: AccessControlUpdate,
    ) -> Result<()> {
        if update.owner.is_none() && update.group.is_none() && update.acl.is_none() {
            return Err(Error::InvalidArgument(
                "setAccessControl requires an owner, group, or acl".into(),
            ));
        }

        let mut request = self
            .http
            .patch(self.path_url(path))
            .query(&[("action", "setAccessControl")])
            .header(CONTENT_LENGTH, 0);
        if let Some(owner) = update.owner {
            request = request.header("x-ms-owner", owner);
        }
        if let Some(group) = update.group {
            request = request.header("x-ms-group", group);
        }
        if let Some(acl) = update.acl {
            request = request.header("x-ms-acl", acl);
        }
        self.send(request).await?;
        Ok(())
    }

    async fn get_properties(&self, path: &RemotePath, upn: bool) -> Result<Headers> {
        let mut request = self.http.head(self.path_url(path));
        if upn {
            request = request.query(&[("upn", "true")]);
        }
        let response = self.send(request).await?;
        Ok(header_view(response.headers()))
    }

    async fn get_access_control(&self, path: &RemotePath, upn: bool) -> Result<Headers> {
        let mut request = self
            .http
            .head(self.path_url(path))
            .query(&[("action", "getAccessControl")]);
        if upn {
            request = request.query(&[("upn", "true")]);
        }
        let response = self.send(request).await?;
        Ok(header_view(response.headers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticToken;

    #[async_trait]
    impl TokenProvider for StaticToken {
        async fn bearer_token(&self, _scope: &str) -> Result<BearerToken> {
            Ok(BearerToken {
                token: "test-token".into(),
                expires_at: None,
            })
        }
    }

    fn client() -> DfsClient {
        DfsClient::new("contoso", "dfs.core.windows.net", Arc::new(StaticToken)).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_account() {
        let result = DfsClient::new("", "dfs.core.windows.net", Arc::new(StaticToken));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_url_building() {
        let client = client();
        assert_eq!(
            client.account_url().as_str(),
            "https://contoso.dfs.core.windows.net/"
        );
        assert_eq!(
            client.filesystem_url("data").as_str(),
            "https://contoso.dfs.core.windows.net/data"
        );
        assert_eq!(
            client
                .path_url(&RemotePath::new("data", "logs/run 1.txt"))
                .as_str(),
            "https://contoso.dfs.core.windows.net/data/logs/run%201.txt"
        );
        // The filesystem root keeps its trailing slash
        assert_eq!(
            client.path_url(&RemotePath::root("data")).as_str(),
            "https://contoso.dfs.core.windows.net/data/"
        );
    }

    #[test]
    fn test_map_status() {
        assert!(matches!(map_status(401, "denied".into()), Error::Auth(_)));
        assert!(matches!(map_status(403, "denied".into()), Error::Auth(_)));
        assert!(matches!(
            map_status(404, "missing".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            map_status(409, "exists".into()),
            Error::Conflict(_)
        ));
        assert!(matches!(
            map_status(412, "precondition".into()),
            Error::Remote { status: 412, .. }
        ));
        // Empty bodies still produce a usable message
        let err = map_status(500, String::new());
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_header_view_conversion() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-ms-properties", "a=YQ==".parse().unwrap());
        headers.insert("Content-Type", "text/plain".parse().unwrap());

        let view = header_view(&headers);
        assert_eq!(view.get("X-MS-Properties"), Some("a=YQ=="));
        assert_eq!(view.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_list_filesystems_body_deserializes() {
        let body = r#"{"filesystems":[
            {"name":"data","lastModified":"Tue, 05 Aug 2025 10:00:00 GMT","eTag":"\"0x1\""},
            {"name":"archive"}
        ]}"#;
        let parsed: ListFilesystemsBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.filesystems.len(), 2);
        let item: FilesystemItem = parsed.filesystems.into_iter().next().unwrap().into();
        assert_eq!(item.name, "data");
        assert_eq!(
            item.last_modified.as_deref(),
            Some("Tue, 05 Aug 2025 10:00:00 GMT")
        );
        assert_eq!(item.etag.as_deref(), Some("\"0x1\""));
    }

    #[test]
    fn test_list_paths_body_deserializes_lenient_fields() {
        // isDirectory arrives as a string, contentLength as number or string
        let body = r#"{"paths":[
            {"name":"logs","isDirectory":"true"},
            {"name":"logs/run.txt","contentLength":123,"owner":"alice","permissions":"rw-r-----"},
            {"name":"logs/old.txt","contentLength":"456"}
        ]}"#;
        let parsed: ListPathsBody = serde_json::from_str(body).unwrap();
        let items: Vec<PathItem> = parsed.paths.into_iter().map(Into::into).collect();

        assert!(items[0].is_directory);
        assert_eq!(items[0].content_length, None);
        assert!(!items[1].is_directory);
        assert_eq!(items[1].content_length, Some(123));
        assert_eq!(items[1].owner.as_deref(), Some("alice"));
        assert_eq!(items[2].content_length, Some(456));
    }

    #[test]
    fn test_empty_list_bodies() {
        let parsed: ListPathsBody = serde_json::from_str("{}").unwrap();
        assert!(parsed.paths.is_empty());
        let parsed: ListFilesystemsBody = serde_json::from_str("{}").unwrap();
        assert!(parsed.filesystems.is_empty());
    }
}
