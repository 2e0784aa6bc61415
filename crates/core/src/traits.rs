//! PathStore trait definition
//!
//! This trait defines the interface for hierarchical-namespace storage
//! operations. It decouples the session logic and the CLI from the REST
//! transport implementation and can be faked for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::RemotePath;

/// Stream of body chunks from a read operation
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// What kind of path a create call produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    File,
    Directory,
}

impl ResourceType {
    /// Value of the `resource` query parameter
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceType::File => "file",
            ResourceType::Directory => "directory",
        }
    }
}

/// A filesystem (container) entry from an account listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemItem {
    /// Filesystem name
    pub name: String,

    /// Last modified timestamp as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Entity tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Root directory ACL, populated only when the caller asked for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
}

/// A path entry from a directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathItem {
    /// Full path name within the filesystem
    pub name: String,

    /// Whether the entry is a directory
    #[serde(default)]
    pub is_directory: bool,

    /// Content length in bytes (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,

    /// Last modified timestamp as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Owning user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Owning group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// POSIX-style permissions string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,

    /// Entity tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl PathItem {
    /// Human-readable size, empty for directories
    pub fn size_human(&self) -> String {
        match self.content_length {
            Some(len) if !self.is_directory => {
                humansize::format_size(len.max(0) as u64, humansize::BINARY)
            }
            _ => String::new(),
        }
    }
}

/// One page of a listing, as returned by the transport
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in server-returned order
    pub items: Vec<T>,

    /// Opaque continuation token; None means the listing is exhausted
    pub continuation: Option<String>,
}

/// Options for an account-level filesystem listing call
#[derive(Debug, Clone, Default)]
pub struct ListFilesystemsOptions {
    /// Only filesystems whose names start with this prefix
    pub prefix: Option<String>,

    /// Maximum number of items the service should return per page
    pub max_results: Option<u32>,

    /// Continuation token from a previous page
    pub continuation: Option<String>,
}

/// Options for a path listing call within a filesystem
#[derive(Debug, Clone, Default)]
pub struct ListPathsOptions {
    /// Directory to list; None lists from the filesystem root
    pub directory: Option<String>,

    /// Whether to descend into subdirectories
    pub recursive: bool,

    /// Maximum number of items the service should return per page
    pub max_results: Option<u32>,

    /// Continuation token from a previous page
    pub continuation: Option<String>,

    /// Return owner/group as user principal names instead of object ids
    pub upn: bool,
}

/// Access-control fields for a setAccessControl call
///
/// At least one field must be set; unset fields are left untouched remotely.
#[derive(Debug, Clone, Default)]
pub struct AccessControlUpdate {
    pub owner: Option<String>,
    pub group: Option<String>,
    pub acl: Option<String>,
}

/// Case-insensitive view of response headers
///
/// Keys are stored lowercased so the pure extraction functions in
/// `properties` do not depend on transport header types.
#[derive(Debug, Clone, Default)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, lowercasing the name
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look up a header by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for Headers {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            headers.insert(&name, value);
        }
        headers
    }
}

/// Trait for hierarchical-namespace storage operations
///
/// Implemented by the REST adapter and by in-memory fakes in tests. Every
/// operation surfaces remote rejections as typed errors; no operation retries.
#[async_trait]
pub trait PathStore: Send + Sync {
    /// Create a filesystem
    async fn create_filesystem(&self, filesystem: &str) -> Result<()>;

    /// Delete a filesystem
    async fn delete_filesystem(&self, filesystem: &str) -> Result<()>;

    /// List filesystems in the account, one page at a time
    async fn list_filesystems(&self, options: ListFilesystemsOptions)
        -> Result<Page<FilesystemItem>>;

    /// Create a file or directory path
    async fn create_path(&self, path: &RemotePath, resource: ResourceType) -> Result<()>;

    /// Stage bytes at the given write position of an uncommitted file
    async fn append(&self, path: &RemotePath, position: u64, data: Bytes) -> Result<()>;

    /// Commit previously appended bytes; `position` is the final length
    async fn flush(&self, path: &RemotePath, position: u64) -> Result<()>;

    /// Read a file's content as a stream of chunks
    async fn read(&self, path: &RemotePath) -> Result<ByteStream>;

    /// List paths under a filesystem, one page at a time
    async fn list_paths(
        &self,
        filesystem: &str,
        options: ListPathsOptions,
    ) -> Result<Page<PathItem>>;

    /// Set owner, group, and/or ACL on a path
    async fn set_access_control(
        &self,
        path: &RemotePath,
        update: AccessControlUpdate,
    ) -> Result<()>;

    /// Fetch a path's properties; returns the raw response headers
    async fn get_properties(&self, path: &RemotePath, upn: bool) -> Result<Headers>;

    /// Fetch a path's access control; returns the raw response headers
    async fn get_access_control(&self, path: &RemotePath, upn: bool) -> Result<Headers>;
}
