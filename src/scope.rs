//! Scope requirements for gated servers.

use std::collections::HashSet;

use crate::error::AuthChallenge;
use crate::token::AccessToken;

/// Scopes a verified token must carry before a request is let through.
///
/// All listed scopes are required. An empty requirement admits every
/// verified token.
///
/// # Example
///
/// ```rust
/// use mcp_tokengate::ScopeRequirement;
///
/// let scopes = ScopeRequirement::one("openid").require("email");
/// assert_eq!(scopes.required_scopes().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopeRequirement {
    required: HashSet<String>,
}

impl ScopeRequirement {
    /// An empty requirement: any verified token passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a single scope.
    pub fn one(scope: impl Into<String>) -> Self {
        Self::new().require(scope)
    }

    /// Require all of the given scopes.
    pub fn all<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a required scope.
    pub fn require(mut self, scope: impl Into<String>) -> Self {
        self.required.insert(scope.into());
        self
    }

    /// Check a verified token against this requirement.
    pub fn check(&self, token: &AccessToken) -> Result<(), AuthChallenge> {
        if self.required.is_subset(&token.scopes) {
            return Ok(());
        }

        Err(AuthChallenge::InsufficientScope {
            required: self.required_scopes(),
            provided: sorted(&token.scopes),
        })
    }

    /// The required scopes, sorted for stable output.
    pub fn required_scopes(&self) -> Vec<String> {
        sorted(&self.required)
    }

    /// Whether no scopes are required.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

fn sorted(scopes: &HashSet<String>) -> Vec<String> {
    let mut list: Vec<String> = scopes.iter().cloned().collect();
    list.sort();
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_scopes(scopes: &[&str]) -> AccessToken {
        AccessToken {
            token: "T1".to_string(),
            client_id: "client-123".to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            expires_at: None,
        }
    }

    #[test]
    fn test_empty_requirement_admits_any_token() {
        let requirement = ScopeRequirement::new();
        assert!(requirement.is_empty());
        assert!(requirement.check(&token_with_scopes(&[])).is_ok());
    }

    #[test]
    fn test_subset_passes() {
        let requirement = ScopeRequirement::one("openid");
        let token = token_with_scopes(&["openid", "profile"]);
        assert!(requirement.check(&token).is_ok());
    }

    #[test]
    fn test_missing_scope_is_rejected() {
        let requirement = ScopeRequirement::all(["openid", "email"]);
        let token = token_with_scopes(&["openid"]);

        let challenge = requirement.check(&token).unwrap_err();
        match challenge {
            AuthChallenge::InsufficientScope { required, provided } => {
                assert_eq!(required, vec!["email".to_string(), "openid".to_string()]);
                assert_eq!(provided, vec!["openid".to_string()]);
            }
            other => panic!("expected InsufficientScope, got {other:?}"),
        }
    }

    #[test]
    fn test_require_accumulates() {
        let requirement = ScopeRequirement::one("openid").require("email").require("openid");
        assert_eq!(
            requirement.required_scopes(),
            vec!["email".to_string(), "openid".to_string()]
        );
    }
}
