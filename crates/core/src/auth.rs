//! Credential model
//!
//! A credential source is selected once at startup and resolved into a single
//! token-provider capability that is passed explicitly into the transport
//! client. There is no global credential state.

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::{Error, Result};

/// OAuth2 scope for storage access
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Where bearer tokens come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service principal settings read from environment variables
    Environment,
    /// Managed identity of the host (instance metadata endpoint)
    ManagedIdentity,
    /// Explicit service principal
    ServicePrincipal {
        client_id: String,
        client_secret: String,
        tenant_id: String,
    },
}

impl CredentialSource {
    /// Build a service-principal source from settings, with flag overrides
    ///
    /// Each field falls back from the explicit flag to the environment to the
    /// configuration file. All three fields are required.
    pub fn service_principal(
        settings: &Settings,
        client_id: Option<String>,
        client_secret: Option<String>,
        tenant_id: Option<String>,
    ) -> Result<Self> {
        let client_id = client_id
            .or_else(|| settings.resolved_client_id())
            .ok_or_else(|| Error::Config("Service principal requires a client id".into()))?;
        let client_secret = client_secret
            .or_else(|| settings.resolved_client_secret())
            .ok_or_else(|| Error::Config("Service principal requires a client secret".into()))?;
        let tenant_id = tenant_id
            .or_else(|| settings.resolved_tenant_id())
            .ok_or_else(|| Error::Config("Service principal requires a tenant id".into()))?;
        Ok(Self::ServicePrincipal {
            client_id,
            client_secret,
            tenant_id,
        })
    }
}

/// A bearer token plus its expiry, as returned by a token endpoint
#[derive(Debug, Clone)]
pub struct BearerToken {
    /// The access token to place in the Authorization header
    pub token: String,
    /// When the token stops being valid; None if the endpoint did not say
    pub expires_at: Option<jiff::Timestamp>,
}

impl BearerToken {
    /// Whether the token is still valid at `now`, with a safety skew
    pub fn is_fresh(&self, now: jiff::Timestamp, skew_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                now.as_second().saturating_add(skew_secs) < expires_at.as_second()
            }
            None => true,
        }
    }
}

/// Capability that yields bearer tokens for a scope
///
/// Implemented by the transport crate's credential flows and by test fakes.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a bearer token for the given scope
    async fn bearer_token(&self, scope: &str) -> Result<BearerToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(second: i64) -> jiff::Timestamp {
        jiff::Timestamp::from_second(second).unwrap()
    }

    #[test]
    fn test_token_freshness() {
        let token = BearerToken {
            token: "t".into(),
            expires_at: Some(ts(1000)),
        };
        assert!(token.is_fresh(ts(500), 60));
        assert!(!token.is_fresh(ts(950), 60));
        assert!(!token.is_fresh(ts(1001), 0));

        let no_expiry = BearerToken {
            token: "t".into(),
            expires_at: None,
        };
        assert!(no_expiry.is_fresh(ts(i64::from(u16::MAX)), 60));
    }

    #[test]
    fn test_service_principal_requires_all_fields() {
        let settings = Settings::default();
        let result = CredentialSource::service_principal(
            &settings,
            Some("client".into()),
            Some("secret".into()),
            None,
        );
        assert!(matches!(result, Err(Error::Config(_))));

        let source = CredentialSource::service_principal(
            &settings,
            Some("client".into()),
            Some("secret".into()),
            Some("tenant".into()),
        )
        .unwrap();
        assert_eq!(
            source,
            CredentialSource::ServicePrincipal {
                client_id: "client".into(),
                client_secret: "secret".into(),
                tenant_id: "tenant".into(),
            }
        );
    }

    #[test]
    fn test_service_principal_falls_back_to_settings() {
        let mut settings = Settings::default();
        settings.auth.client_id = Some("cfg-client".into());
        settings.auth.client_secret = Some("cfg-secret".into());
        settings.auth.tenant_id = Some("cfg-tenant".into());

        let source = CredentialSource::service_principal(&settings, None, None, None).unwrap();
        match source {
            CredentialSource::ServicePrincipal { client_id, .. } => {
                assert_eq!(client_id, "cfg-client");
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
