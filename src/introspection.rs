//! Token introspection against an OAuth2 identity provider.
//!
//! The gate never inspects token contents itself. Every presented token is
//! forwarded to the provider's introspection endpoint (Google's `tokeninfo`
//! convention: `GET {endpoint}?access_token={token}`) and the provider's
//! answer is the only evidence considered. [`TokenIntrospecter`] is the seam
//! that makes the remote call substitutable in tests.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::GateError;

/// Default bound on a single introspection request.
pub const DEFAULT_INTROSPECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Introspection response returned by the identity provider.
///
/// The field set follows Google's `tokeninfo` endpoint; unknown fields are
/// ignored so provider additions do not break decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    /// Error indicator set when the provider rejects the token.
    #[serde(default)]
    pub error: Option<String>,

    /// Audience: the client the token was issued to.
    #[serde(default)]
    pub aud: Option<String>,

    /// Subject email, when the token carries an identity.
    #[serde(default)]
    pub email: Option<String>,

    /// Space-delimited scope string.
    #[serde(default)]
    pub scope: Option<String>,

    /// Expiration as a Unix timestamp.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl TokenInfo {
    /// Parse the scope string into a set of individual scopes.
    ///
    /// An absent or empty scope string yields an empty set.
    pub fn scopes(&self) -> HashSet<String> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(String::from)
            .collect()
    }
}

/// Looks up what the identity provider knows about a bearer token.
///
/// The production implementation is [`HttpIntrospecter`]; tests substitute
/// canned responses so no network is involved. Implementations must be
/// cheaply cloneable because the verifier is cloned into each request
/// future.
///
/// # Example
///
/// ```rust
/// use mcp_tokengate::{GateError, TokenInfo, TokenIntrospecter};
///
/// #[derive(Clone)]
/// struct AlwaysValid;
///
/// impl TokenIntrospecter for AlwaysValid {
///     async fn introspect(&self, _token: &str) -> Result<TokenInfo, GateError> {
///         Ok(TokenInfo {
///             aud: Some("client-123".to_string()),
///             scope: Some("openid".to_string()),
///             ..Default::default()
///         })
///     }
/// }
/// ```
pub trait TokenIntrospecter: Clone + Send + Sync + 'static {
    /// Fetch the provider's view of `token`.
    ///
    /// An `Err` means the question could not be answered (network failure,
    /// undecodable body). A provider that answered but rejected the token
    /// is an `Ok` with the [`TokenInfo::error`] field set; policy belongs
    /// to the verifier, not here.
    fn introspect(&self, token: &str) -> impl Future<Output = Result<TokenInfo, GateError>> + Send;
}

/// Queries an OAuth2 token-introspection endpoint over HTTP.
///
/// Sends `GET {endpoint}?access_token={token}` with a bounded timeout.
/// One attempt per call; retries would only delay the caller's 401.
#[derive(Debug, Clone)]
pub struct HttpIntrospecter {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpIntrospecter {
    /// Create an introspecter for `endpoint` with the default timeout.
    pub fn new(endpoint: Url) -> Result<Self, GateError> {
        Self::with_timeout(endpoint, DEFAULT_INTROSPECTION_TIMEOUT)
    }

    /// Create an introspecter with a custom request timeout.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, GateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// The endpoint this introspecter queries.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TokenIntrospecter for HttpIntrospecter {
    async fn introspect(&self, token: &str) -> Result<TokenInfo, GateError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("access_token", token)])
            .send()
            .await?;

        // Google's tokeninfo reports bad tokens with a 4xx status and an
        // `error` field in the body. Decode the body regardless of status
        // and leave the policy decision to the verifier.
        let status = response.status();
        let info = response
            .json::<TokenInfo>()
            .await
            .map_err(|source| GateError::IntrospectionBody { status, source })?;

        tracing::trace!(%status, "introspection response received");
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_split_on_whitespace() {
        let info = TokenInfo {
            scope: Some("openid profile email".to_string()),
            ..Default::default()
        };
        let scopes = info.scopes();
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains("openid"));
        assert!(scopes.contains("profile"));
        assert!(scopes.contains("email"));
    }

    #[test]
    fn test_scopes_collapse_repeated_whitespace() {
        let info = TokenInfo {
            scope: Some("  openid   profile ".to_string()),
            ..Default::default()
        };
        assert_eq!(info.scopes().len(), 2);
    }

    #[test]
    fn test_no_scope_string_yields_empty_set() {
        assert!(TokenInfo::default().scopes().is_empty());

        let empty = TokenInfo {
            scope: Some(String::new()),
            ..Default::default()
        };
        assert!(empty.scopes().is_empty());
    }

    #[test]
    fn test_decode_successful_response() {
        let json = r#"{
            "aud": "client-123",
            "email": "alice@example.com",
            "scope": "openid profile",
            "exp": 1999999999
        }"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.error, None);
        assert_eq!(info.aud.as_deref(), Some("client-123"));
        assert_eq!(info.email.as_deref(), Some("alice@example.com"));
        assert_eq!(info.exp, Some(1_999_999_999));
    }

    #[test]
    fn test_decode_error_response() {
        let json = r#"{"error": "invalid_token", "error_description": "Invalid Value"}"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.error.as_deref(), Some("invalid_token"));
        assert_eq!(info.aud, None);
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let json = r#"{
            "aud": "client-123",
            "azp": "client-123",
            "sub": "108417623364",
            "email_verified": "true",
            "access_type": "online"
        }"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.aud.as_deref(), Some("client-123"));
    }

    #[test]
    fn test_decode_empty_object() {
        let info: TokenInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, TokenInfo::default());
    }
}
