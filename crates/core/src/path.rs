//! Remote path handling
//!
//! A remote location is a filesystem (the container) plus a slash-delimited
//! path inside it. Paths are stored without a leading slash; an empty path
//! addresses the filesystem root.

use crate::error::{Error, Result};

/// A location inside a storage account: filesystem name plus path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Filesystem (container) name
    pub filesystem: String,
    /// Slash-delimited path within the filesystem (empty for the root)
    pub path: String,
}

impl RemotePath {
    /// Create a new RemotePath, normalizing slashes
    pub fn new(filesystem: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = path.trim_matches('/').to_string();
        Self {
            filesystem: filesystem.into(),
            path,
        }
    }

    /// The filesystem root
    pub fn root(filesystem: impl Into<String>) -> Self {
        Self::new(filesystem, "")
    }

    /// Whether this path addresses the filesystem root
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Join a child component onto this path
    pub fn join(&self, child: &str) -> Self {
        let child = child.trim_matches('/');
        let path = if self.path.is_empty() {
            child.to_string()
        } else {
            format!("{}/{child}", self.path)
        };
        Self {
            filesystem: self.filesystem.clone(),
            path,
        }
    }

    /// The last path component, if any
    pub fn file_name(&self) -> Option<&str> {
        if self.path.is_empty() {
            None
        } else {
            self.path.rsplit('/').next()
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.filesystem)
        } else {
            write!(f, "{}/{}", self.filesystem, self.path)
        }
    }
}

/// Validate a filesystem name as accepted by the service
///
/// Names are 3-63 characters of lowercase letters, digits, and single
/// hyphens, starting and ending with a letter or digit.
pub fn validate_filesystem_name(name: &str) -> Result<()> {
    if name.len() < 3 || name.len() > 63 {
        return Err(Error::InvalidPath(format!(
            "Filesystem name '{name}' must be between 3 and 63 characters"
        )));
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars {
        return Err(Error::InvalidPath(format!(
            "Filesystem name '{name}' may only contain lowercase letters, digits, and hyphens"
        )));
    }
    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        return Err(Error::InvalidPath(format!(
            "Filesystem name '{name}' has misplaced hyphens"
        )));
    }
    Ok(())
}
