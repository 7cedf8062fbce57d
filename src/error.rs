//! Error and rejection types for the token gate.
//!
//! Two families live here. [`GateError`] covers operational failures:
//! bad configuration, unreachable introspection endpoints, undecodable
//! provider responses. [`AuthChallenge`] is the HTTP-facing rejection a
//! gated request receives, rendered as an RFC 6750 `WWW-Authenticate`
//! challenge. A rejected token never carries its reason back to the
//! caller; the reason is logged server-side and the challenge stays
//! uniform.

use http::StatusCode;

/// Boxed error type used at service boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while configuring or operating the gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A required environment variable was not set.
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// A configured URL failed to parse.
    #[error("Invalid {name} URL {value:?}: {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The introspection request could not be completed.
    #[error("Introspection request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The introspection response body was not the expected shape.
    #[error("Introspection response ({status}) could not be decoded: {source}")]
    IntrospectionBody {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },

    /// Introspection failed for a reason outside the HTTP client.
    #[error("Introspection failed: {0}")]
    Introspection(String),
}

/// Rejection returned by the HTTP gate.
///
/// Maps onto the RFC 6750 error codes: missing and invalid tokens answer
/// 401, insufficient scope answers 403. [`www_authenticate`] builds the
/// challenge header value, including a `resource_metadata` pointer when
/// the server advertises one (RFC 9728).
///
/// [`www_authenticate`]: AuthChallenge::www_authenticate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthChallenge {
    /// No bearer token was presented.
    #[error("Missing bearer token")]
    MissingToken,

    /// The token was presented but did not pass verification.
    #[error("Invalid or expired access token")]
    InvalidToken,

    /// The token verified but lacks scopes the server requires.
    #[error(
        "Insufficient scope. Required: [{}], provided: [{}]",
        .required.join(", "),
        .provided.join(", ")
    )]
    InsufficientScope {
        /// Scopes the server requires.
        required: Vec<String>,
        /// Scopes the token actually carried.
        provided: Vec<String>,
    },
}

impl AuthChallenge {
    /// HTTP status code for this rejection.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthChallenge::MissingToken | AuthChallenge::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthChallenge::InsufficientScope { .. } => StatusCode::FORBIDDEN,
        }
    }

    /// Build the `WWW-Authenticate` header value for this rejection.
    ///
    /// When `resource_metadata_url` is set it is included as the
    /// `resource_metadata` challenge parameter so clients can discover
    /// the authorization server.
    pub fn www_authenticate(&self, resource_metadata_url: Option<&str>) -> String {
        let mut parts = Vec::new();

        if let Some(url) = resource_metadata_url {
            parts.push(format!("resource_metadata=\"{url}\""));
        }

        match self {
            AuthChallenge::MissingToken => {
                if parts.is_empty() {
                    return "Bearer".to_string();
                }
            }
            AuthChallenge::InvalidToken => {
                parts.push("error=\"invalid_token\"".to_string());
                parts.push(
                    "error_description=\"The access token did not pass verification\"".to_string(),
                );
            }
            AuthChallenge::InsufficientScope { required, .. } => {
                parts.push("error=\"insufficient_scope\"".to_string());
                parts.push(format!("scope=\"{}\"", required.join(" ")));
            }
        }

        format!("Bearer {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthChallenge::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthChallenge::InvalidToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthChallenge::InsufficientScope {
                required: vec!["openid".to_string()],
                provided: vec![],
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_missing_token_bare_challenge() {
        assert_eq!(AuthChallenge::MissingToken.www_authenticate(None), "Bearer");
    }

    #[test]
    fn test_missing_token_with_metadata() {
        let header = AuthChallenge::MissingToken
            .www_authenticate(Some("https://rs.example.com/.well-known/oauth-protected-resource"));
        assert_eq!(
            header,
            "Bearer resource_metadata=\"https://rs.example.com/.well-known/oauth-protected-resource\""
        );
    }

    #[test]
    fn test_invalid_token_challenge() {
        let header = AuthChallenge::InvalidToken.www_authenticate(None);
        assert!(header.starts_with("Bearer "));
        assert!(header.contains("error=\"invalid_token\""));
        assert!(header.contains("error_description="));
    }

    #[test]
    fn test_invalid_token_challenge_leads_with_metadata() {
        let header = AuthChallenge::InvalidToken.www_authenticate(Some("https://rs.example.com/md"));
        assert!(header.starts_with("Bearer resource_metadata=\"https://rs.example.com/md\", "));
        assert!(header.contains("error=\"invalid_token\""));
    }

    #[test]
    fn test_insufficient_scope_challenge() {
        let challenge = AuthChallenge::InsufficientScope {
            required: vec!["openid".to_string(), "email".to_string()],
            provided: vec!["profile".to_string()],
        };
        let header = challenge.www_authenticate(None);
        assert!(header.contains("error=\"insufficient_scope\""));
        assert!(header.contains("scope=\"openid email\""));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AuthChallenge::MissingToken.to_string(),
            "Missing bearer token"
        );
        assert_eq!(
            AuthChallenge::InvalidToken.to_string(),
            "Invalid or expired access token"
        );
        let scope = AuthChallenge::InsufficientScope {
            required: vec!["openid".to_string()],
            provided: vec!["profile".to_string()],
        };
        assert_eq!(
            scope.to_string(),
            "Insufficient scope. Required: [openid], provided: [profile]"
        );
    }

    #[test]
    fn test_gate_error_display() {
        let err = GateError::MissingConfig("OAUTH_CLIENT_ID");
        assert_eq!(
            err.to_string(),
            "Missing required configuration: OAUTH_CLIENT_ID"
        );

        let err = GateError::Introspection("connection reset".to_string());
        assert_eq!(err.to_string(), "Introspection failed: connection reset");
    }
}
