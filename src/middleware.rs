//! Tower middleware gating HTTP requests on bearer-token verification.
//!
//! [`TokenGateLayer`] wraps a service (typically the axum router carrying
//! the MCP endpoint) and runs every request through a [`TokenVerifier`]
//! before it reaches the inner service. Verified requests proceed with the
//! [`AccessToken`](crate::AccessToken) record attached to their extensions; everything else is
//! answered with an RFC 6750 challenge and never touches the inner service.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use crate::error::{AuthChallenge, BoxError};
use crate::metadata::ProtectedResourceMetadata;
use crate::scope::ScopeRequirement;
use crate::verifier::TokenVerifier;

/// Extract a bearer token from an `Authorization` header value.
///
/// Returns `None` unless the value uses the `Bearer` scheme; the scheme
/// match is case-sensitive per RFC 6750's ABNF.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.trim().strip_prefix("Bearer ").map(|t| t.trim())
}

/// Tower layer applying the token gate to a service.
///
/// The `/.well-known/oauth-protected-resource` path is always public so
/// clients can discover the authorization server before they hold a token;
/// further public paths can be added with [`public_path`].
///
/// # Example
///
/// ```rust,no_run
/// use mcp_tokengate::{AccessToken, ScopeRequirement, StaticTokenVerifier, TokenGateLayer};
///
/// let verifier = StaticTokenVerifier::new(vec![AccessToken {
///     token: "demo-token".to_string(),
///     client_id: "demo".to_string(),
///     scopes: std::iter::once("openid".to_string()).collect(),
///     expires_at: None,
/// }]);
///
/// let gate = TokenGateLayer::new(verifier)
///     .resource_metadata_url("https://mcp.example.com/.well-known/oauth-protected-resource")
///     .required_scopes(ScopeRequirement::one("openid"));
///
/// let app: axum::Router = axum::Router::new().layer(gate);
/// ```
///
/// [`public_path`]: TokenGateLayer::public_path
#[derive(Clone)]
pub struct TokenGateLayer<V: TokenVerifier> {
    verifier: V,
    resource_metadata_url: Option<String>,
    required_scopes: ScopeRequirement,
    public_paths: Vec<String>,
}

impl<V: TokenVerifier> TokenGateLayer<V> {
    /// Gate requests behind `verifier`.
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            resource_metadata_url: None,
            required_scopes: ScopeRequirement::new(),
            public_paths: vec![ProtectedResourceMetadata::well_known_path().to_string()],
        }
    }

    /// Advertise the RFC 9728 metadata document in challenges.
    pub fn resource_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.resource_metadata_url = Some(url.into());
        self
    }

    /// Require every verified token to carry these scopes.
    pub fn required_scopes(mut self, scopes: ScopeRequirement) -> Self {
        self.required_scopes = scopes;
        self
    }

    /// Add a path prefix that bypasses the gate.
    pub fn public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }
}

impl<S, V: TokenVerifier> Layer<S> for TokenGateLayer<V> {
    type Service = TokenGateService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenGateService {
            inner,
            verifier: self.verifier.clone(),
            resource_metadata_url: self.resource_metadata_url.clone(),
            required_scopes: self.required_scopes.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

/// Tower service created by [`TokenGateLayer`].
///
/// For each request outside the public paths:
///
/// 1. extract the `Authorization: Bearer` token (absent: 401);
/// 2. run the [`TokenVerifier`] (rejected: 401, reason logged only);
/// 3. check required scopes (missing: 403);
/// 4. attach the [`AccessToken`](crate::AccessToken) record to the request extensions and
///    forward to the inner service.
#[derive(Clone)]
pub struct TokenGateService<S, V: TokenVerifier> {
    inner: S,
    verifier: V,
    resource_metadata_url: Option<String>,
    required_scopes: ScopeRequirement,
    public_paths: Vec<String>,
}

impl<S, V> tower_service::Service<Request<Body>> for TokenGateService<S, V>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    V: TokenVerifier,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let public_paths = self.public_paths.clone();
        let verifier = self.verifier.clone();
        let required_scopes = self.required_scopes.clone();
        let resource_metadata_url = self.resource_metadata_url.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if public_paths.iter().any(|p| path.starts_with(p.as_str())) {
                return inner.call(req).await;
            }

            // Well-known documents stay public even when nested under a
            // mount point.
            if path.contains("/.well-known/") {
                return inner.call(req).await;
            }

            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer_token)
                .map(str::to_string);

            let Some(token) = token else {
                tracing::debug!(%path, "request without bearer token");
                return Ok(challenge_response(
                    &AuthChallenge::MissingToken,
                    resource_metadata_url.as_deref(),
                ));
            };

            let Some(access) = verifier.verify(&token).await else {
                return Ok(challenge_response(
                    &AuthChallenge::InvalidToken,
                    resource_metadata_url.as_deref(),
                ));
            };

            if let Err(challenge) = required_scopes.check(&access) {
                tracing::warn!(client_id = %access.client_id, "token lacks required scopes");
                return Ok(challenge_response(
                    &challenge,
                    resource_metadata_url.as_deref(),
                ));
            }

            let mut req = req;
            req.extensions_mut().insert(access);
            inner.call(req).await
        })
    }
}

/// Build the HTTP response for a rejected request: status code,
/// `WWW-Authenticate` challenge, and a JSON-RPC error body so MCP clients
/// see a well-formed protocol error.
fn challenge_response(challenge: &AuthChallenge, resource_metadata_url: Option<&str>) -> Response {
    let www_authenticate = challenge.www_authenticate(resource_metadata_url);

    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "error": {
            "code": -32001,
            "message": challenge.to_string()
        },
        "id": null
    });

    let mut response = (challenge.status_code(), axum::Json(body)).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        www_authenticate
            .parse()
            .unwrap_or_else(|_| HeaderValue::from_static("Bearer")),
    );
    response
}
