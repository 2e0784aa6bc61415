//! dlk-core: Core library for the dlk datalake CLI client
//!
//! This crate provides the transport-independent functionality for the dlk
//! CLI, including:
//! - Configuration and credential settings
//! - Remote path handling
//! - The PathStore trait for storage operations
//! - The chunked upload/download and paginated listing sessions
//! - Header-derived property parsing
//!
//! It is designed to be independent of any HTTP client, allowing the session
//! logic to be tested against in-memory stores.

pub mod auth;
pub mod config;
pub mod error;
pub mod paging;
pub mod path;
pub mod properties;
pub mod traits;
pub mod transfer;

pub use auth::{BearerToken, CredentialSource, TokenProvider, STORAGE_SCOPE};
pub use config::{ConfigManager, Settings};
pub use error::{Error, Result};
pub use paging::{drain_pages, Listing, PagingOptions};
pub use path::RemotePath;
pub use properties::{SystemProperties, UserProperties};
pub use traits::{
    AccessControlUpdate, ByteStream, FilesystemItem, Headers, ListFilesystemsOptions,
    ListPathsOptions, Page, PathItem, PathStore, ResourceType,
};
