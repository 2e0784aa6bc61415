//! dlk-rest: REST transport adapter for the dlk CLI client
//!
//! This crate provides the implementation of the PathStore trait over the
//! DFS REST endpoint dialect, plus the token providers for the supported
//! credential sources. It is the only crate that depends on an HTTP client.

pub mod auth;
pub mod client;

pub use auth::{provider_for, ClientSecretCredential, ManagedIdentityCredential};
pub use client::{DfsClient, API_VERSION};
