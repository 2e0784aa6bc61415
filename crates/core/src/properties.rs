//! Header-derived property views
//!
//! Property queries return everything in response headers. The functions here
//! are pure: they take a header view and produce the user-property map, the
//! system-property record, or the ACL string, without touching the transport.

use std::collections::BTreeMap;

use base64::Engine as _;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::traits::Headers;

/// Header carrying the comma-separated user property list
pub const USER_PROPERTIES_HEADER: &str = "x-ms-properties";
/// Header carrying a path's access control list
pub const ACL_HEADER: &str = "x-ms-acl";

/// User-defined properties of a path
pub type UserProperties = BTreeMap<String, String>;

/// Parse the user-property header into a map
///
/// The header is a comma-separated list of `key=value` entries whose values
/// the service base64-encodes. With `decode` set, each value is base64- and
/// UTF-8-decoded; otherwise the raw base64 text is returned unchanged. An
/// absent or empty header yields an empty map.
pub fn parse_user_properties(header: Option<&str>, decode: bool) -> Result<UserProperties> {
    let mut properties = UserProperties::new();

    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(properties),
    };

    for entry in header.split(',') {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            Error::InvalidProperties(format!("entry '{entry}' has no '=' separator"))
        })?;

        let value = if decode {
            let raw = base64::engine::general_purpose::STANDARD
                .decode(value)
                .map_err(|e| {
                    Error::InvalidProperties(format!("value of '{key}' is not base64: {e}"))
                })?;
            String::from_utf8(raw).map_err(|e| {
                Error::InvalidProperties(format!("value of '{key}' is not UTF-8: {e}"))
            })?
        } else {
            value.to_string()
        };

        properties.insert(key.to_string(), value);
    }

    Ok(properties)
}

/// User properties read from a header view
pub fn user_properties(headers: &Headers, decode: bool) -> Result<UserProperties> {
    parse_user_properties(headers.get(USER_PROPERTIES_HEADER), decode)
}

/// The ACL string from a getAccessControl response
pub fn acl_from_headers(headers: &Headers) -> Result<String> {
    headers
        .get(ACL_HEADER)
        .map(String::from)
        .ok_or_else(|| Error::MissingHeader(ACL_HEADER.into()))
}

/// Fixed system properties of a path, projected from response headers
#[derive(Debug, Clone, Serialize)]
pub struct SystemProperties {
    /// Fully qualified URL of the queried path
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl SystemProperties {
    /// Project the fixed header set into a record
    ///
    /// `url` is synthesized by the caller from the account name, DNS suffix,
    /// and queried path; it is not present in the response.
    pub fn from_headers(headers: &Headers, url: String) -> Self {
        let get = |name: &str| headers.get(name).map(String::from);
        Self {
            url,
            last_modified: get("last-modified"),
            cache_control: get("cache-control"),
            content_type: get("content-type"),
            content_language: get("content-language"),
            content_disposition: get("content-disposition"),
            owner: get("x-ms-owner"),
            group: get("x-ms-group"),
            permissions: get("x-ms-permissions"),
            resource_type: get("x-ms-resource-type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_properties_decoded() {
        // "YQ==" is "a", "Yg==" is "b"
        let parsed = parse_user_properties(Some("a=YQ==,b=Yg=="), true).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], "a");
        assert_eq!(parsed["b"], "b");
    }

    #[test]
    fn test_user_properties_raw() {
        let parsed = parse_user_properties(Some("a=YQ==,b=Yg=="), false).unwrap();
        assert_eq!(parsed["a"], "YQ==");
        assert_eq!(parsed["b"], "Yg==");
    }

    #[test]
    fn test_user_properties_absent_or_empty() {
        assert!(parse_user_properties(None, true).unwrap().is_empty());
        assert!(parse_user_properties(Some(""), true).unwrap().is_empty());
        assert!(parse_user_properties(None, false).unwrap().is_empty());
    }

    #[test]
    fn test_user_properties_value_containing_equals() {
        // Only the first '=' separates key and value
        let parsed = parse_user_properties(Some("k=dj1=="), false).unwrap();
        assert_eq!(parsed["k"], "dj1==");
    }

    #[test]
    fn test_user_properties_malformed_entry() {
        let result = parse_user_properties(Some("no-separator"), false);
        assert!(matches!(result, Err(Error::InvalidProperties(_))));
    }

    #[test]
    fn test_user_properties_bad_base64() {
        let result = parse_user_properties(Some("k=!!!"), true);
        assert!(matches!(result, Err(Error::InvalidProperties(_))));
    }

    #[test]
    fn test_user_properties_from_header_view() {
        let headers: Headers = [("x-ms-properties", "team=b3Bz")].into_iter().collect();
        let parsed = user_properties(&headers, true).unwrap();
        assert_eq!(parsed["team"], "ops");
    }

    #[test]
    fn test_acl_from_headers() {
        let headers: Headers = [("x-ms-acl", "user::rwx,group::r-x,other::---")]
            .into_iter()
            .collect();
        assert_eq!(
            acl_from_headers(&headers).unwrap(),
            "user::rwx,group::r-x,other::---"
        );
    }

    #[test]
    fn test_acl_missing_header() {
        let headers = Headers::new();
        let result = acl_from_headers(&headers);
        assert!(matches!(result, Err(Error::MissingHeader(_))));
    }

    #[test]
    fn test_system_properties_projection() {
        let headers: Headers = [
            ("Last-Modified", "Tue, 05 Aug 2025 10:00:00 GMT"),
            ("Content-Type", "application/octet-stream"),
            ("x-ms-owner", "alice"),
            ("x-ms-group", "engineers"),
            ("x-ms-permissions", "rwxr-x---"),
            ("x-ms-resource-type", "file"),
        ]
        .into_iter()
        .collect();

        let props = SystemProperties::from_headers(
            &headers,
            "https://contoso.dfs.core.windows.net/data/logs/run.txt".into(),
        );

        assert_eq!(
            props.url,
            "https://contoso.dfs.core.windows.net/data/logs/run.txt"
        );
        assert_eq!(
            props.last_modified.as_deref(),
            Some("Tue, 05 Aug 2025 10:00:00 GMT")
        );
        assert_eq!(props.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(props.owner.as_deref(), Some("alice"));
        assert_eq!(props.group.as_deref(), Some("engineers"));
        assert_eq!(props.permissions.as_deref(), Some("rwxr-x---"));
        assert_eq!(props.resource_type.as_deref(), Some("file"));
        assert!(props.cache_control.is_none());
        assert!(props.content_language.is_none());
        assert!(props.content_disposition.is_none());
    }
}
