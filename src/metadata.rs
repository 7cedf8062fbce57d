//! Protected Resource Metadata (RFC 9728).
//!
//! A gated server publishes a small JSON document at
//! `/.well-known/oauth-protected-resource` telling clients which
//! authorization server issues its tokens and which scopes it expects.
//! The gate's 401/403 challenges point here via the `resource_metadata`
//! parameter, so an unauthenticated client can bootstrap the OAuth flow
//! without out-of-band configuration.

use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Protected Resource Metadata document per RFC 9728 Section 3.
///
/// # Example
///
/// ```rust
/// use mcp_tokengate::ProtectedResourceMetadata;
///
/// let metadata = ProtectedResourceMetadata::new("https://mcp.example.com")
///     .authorization_server("https://accounts.google.com")
///     .scope("openid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// The resource server's identifier URL, as clients address it.
    pub resource: String,

    /// Authorization server issuers that can mint tokens for this resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization_servers: Vec<String>,

    /// Scopes this resource server expects tokens to carry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,

    /// How bearer tokens may be presented. Always `["header"]` here; the
    /// gate only reads the `Authorization` header.
    #[serde(default = "default_bearer_methods")]
    pub bearer_methods_supported: Vec<String>,

    /// Optional documentation URL for the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_documentation: Option<String>,
}

fn default_bearer_methods() -> Vec<String> {
    vec!["header".to_string()]
}

impl ProtectedResourceMetadata {
    /// Metadata for the resource at `resource`.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            authorization_servers: Vec::new(),
            scopes_supported: Vec::new(),
            bearer_methods_supported: default_bearer_methods(),
            resource_documentation: None,
        }
    }

    /// Metadata advertising the issuer and scopes from `config`.
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut metadata = Self::new(config.resource())
            .authorization_server(config.issuer_url.as_str().trim_end_matches('/'));
        for scope in &config.required_scopes {
            metadata = metadata.scope(scope.clone());
        }
        metadata
    }

    /// Add an authorization server issuer URL.
    pub fn authorization_server(mut self, issuer_url: impl Into<String>) -> Self {
        self.authorization_servers.push(issuer_url.into());
        self
    }

    /// Add a supported scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes_supported.push(scope.into());
        self
    }

    /// Set the resource documentation URL.
    pub fn resource_documentation(mut self, url: impl Into<String>) -> Self {
        self.resource_documentation = Some(url.into());
        self
    }

    /// The well-known path the document is served at (RFC 9728).
    pub fn well_known_path() -> &'static str {
        "/.well-known/oauth-protected-resource"
    }

    /// Absolute URL of this document, derived from the resource URL.
    ///
    /// This is the value challenges advertise as `resource_metadata`.
    pub fn document_url(&self) -> String {
        format!(
            "{}{}",
            self.resource.trim_end_matches('/'),
            Self::well_known_path()
        )
    }
}

/// Router serving the metadata document at its well-known path.
///
/// Merge this into the server's router; the gate treats the well-known
/// path as public, so the document stays reachable without a token.
pub fn metadata_router(metadata: ProtectedResourceMetadata) -> Router {
    Router::new().route(
        ProtectedResourceMetadata::well_known_path(),
        get(move || {
            let metadata = metadata.clone();
            async move { Json(metadata) }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use url::Url;

    #[test]
    fn test_builder() {
        let metadata = ProtectedResourceMetadata::new("https://mcp.example.com")
            .authorization_server("https://accounts.google.com")
            .scope("openid")
            .scope("email")
            .resource_documentation("https://docs.example.com");

        assert_eq!(metadata.resource, "https://mcp.example.com");
        assert_eq!(
            metadata.authorization_servers,
            vec!["https://accounts.google.com"]
        );
        assert_eq!(metadata.scopes_supported, vec!["openid", "email"]);
        assert_eq!(metadata.bearer_methods_supported, vec!["header"]);
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let metadata = ProtectedResourceMetadata::new("https://mcp.example.com")
            .authorization_server("https://accounts.google.com");

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["resource"], "https://mcp.example.com");
        assert_eq!(
            json["authorization_servers"][0],
            "https://accounts.google.com"
        );
        assert_eq!(json["bearer_methods_supported"][0], "header");
        assert!(json.get("scopes_supported").is_none());
        assert!(json.get("resource_documentation").is_none());
    }

    #[test]
    fn test_document_url() {
        let metadata = ProtectedResourceMetadata::new("http://localhost:8080");
        assert_eq!(
            metadata.document_url(),
            "http://localhost:8080/.well-known/oauth-protected-resource"
        );

        let slashed = ProtectedResourceMetadata::new("http://localhost:8080/");
        assert_eq!(slashed.document_url(), metadata.document_url());
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig::new("client-123", Url::parse("http://localhost:8080").unwrap())
            .with_required_scopes(vec!["openid".to_string(), "email".to_string()]);

        let metadata = ProtectedResourceMetadata::from_config(&config);
        assert_eq!(metadata.resource, "http://localhost:8080");
        assert_eq!(
            metadata.authorization_servers,
            vec!["https://accounts.google.com"]
        );
        assert_eq!(metadata.scopes_supported, vec!["openid", "email"]);
    }

    #[tokio::test]
    async fn test_router_serves_document() {
        let metadata = ProtectedResourceMetadata::new("https://mcp.example.com")
            .authorization_server("https://accounts.google.com")
            .scope("openid");
        let app = metadata_router(metadata);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(ProtectedResourceMetadata::well_known_path())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let document: ProtectedResourceMetadata = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(document.resource, "https://mcp.example.com");
        assert_eq!(document.scopes_supported, vec!["openid"]);
    }
}
