//! Token providers
//!
//! Implements the TokenProvider capability for the three credential sources:
//! an explicit service principal (OAuth2 client-credentials flow), the host's
//! managed identity (instance metadata endpoint), and service principal
//! settings read from the conventional AZURE_* environment variables.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use dlk_core::{BearerToken, CredentialSource, Error, Result, TokenProvider};

/// Default authority host for the client-credentials flow
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Default instance metadata endpoint for managed identity tokens
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";

/// Environment variables of the conventional environment credential
const ENV_AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
const ENV_AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
const ENV_AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";

/// Resolve a credential source into a token provider
pub fn provider_for(source: &CredentialSource) -> Result<Arc<dyn TokenProvider>> {
    match source {
        CredentialSource::Environment => Ok(Arc::new(ClientSecretCredential::from_env()?)),
        CredentialSource::ManagedIdentity => Ok(Arc::new(ManagedIdentityCredential::new())),
        CredentialSource::ServicePrincipal {
            client_id,
            client_secret,
            tenant_id,
        } => Ok(Arc::new(ClientSecretCredential::new(
            client_id,
            client_secret,
            tenant_id,
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds (client-credentials flow)
    #[serde(default)]
    expires_in: Option<u64>,
    /// Absolute unix expiry (instance metadata flow, returned as a string)
    #[serde(default)]
    expires_on: Option<String>,
}

impl TokenResponse {
    fn into_bearer(self, now: jiff::Timestamp) -> BearerToken {
        let expires_at = self
            .expires_on
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| {
                self.expires_in
                    .map(|secs| now.as_second().saturating_add(secs as i64))
            })
            .and_then(|second| jiff::Timestamp::from_second(second).ok());
        BearerToken {
            token: self.access_token,
            expires_at,
        }
    }
}

/// Service principal credential using the OAuth2 client-credentials flow
pub struct ClientSecretCredential {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    tenant_id: String,
    authority: String,
}

impl ClientSecretCredential {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            authority: DEFAULT_AUTHORITY.to_string(),
        }
    }

    /// Override the authority host (sovereign clouds, test servers)
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Build from the conventional AZURE_* environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| {
            lookup(name).ok_or_else(|| {
                Error::Config(format!(
                    "Environment credential requires the {name} environment variable"
                ))
            })
        };
        Ok(Self::new(
            require(ENV_AZURE_CLIENT_ID)?,
            require(ENV_AZURE_CLIENT_SECRET)?,
            require(ENV_AZURE_TENANT_ID)?,
        ))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[async_trait]
impl TokenProvider for ClientSecretCredential {
    async fn bearer_token(&self, scope: &str) -> Result<BearerToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;
        tracing::debug!(client_id = %self.client_id, "acquired service principal token");
        Ok(token.into_bearer(jiff::Timestamp::now()))
    }
}

/// Managed identity credential backed by the instance metadata endpoint
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    endpoint: String,
}

impl ManagedIdentityCredential {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
        }
    }

    /// Override the metadata endpoint (test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

/// The metadata endpoint takes a resource, not a scope
fn resource_from_scope(scope: &str) -> &str {
    scope.strip_suffix(".default").unwrap_or(scope)
}

#[async_trait]
impl TokenProvider for ManagedIdentityCredential {
    async fn bearer_token(&self, scope: &str) -> Result<BearerToken> {
        let response = self
            .http
            .get(&self.endpoint)
            .header("Metadata", "true")
            .query(&[
                ("api-version", IMDS_API_VERSION),
                ("resource", resource_from_scope(scope)),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "instance metadata endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;
        tracing::debug!("acquired managed identity token");
        Ok(token.into_bearer(jiff::Timestamp::now()))
    }
}
