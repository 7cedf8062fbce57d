//! Access-token records produced by verification.

use std::collections::HashSet;

/// A bearer token that passed introspection and policy checks.
///
/// Instances are only produced by a [`TokenVerifier`](crate::TokenVerifier);
/// holding one means the token's audience matched this server and, when an
/// allow-list is configured, its subject was listed. The middleware attaches
/// the record to the request extensions so handlers can read the caller's
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The raw bearer token as presented by the caller.
    pub token: String,
    /// Client the token was issued to (the provider's `aud` field).
    pub client_id: String,
    /// Scopes granted to the token.
    pub scopes: HashSet<String>,
    /// Expiration as a Unix timestamp, when the provider reported one.
    pub expires_at: Option<u64>,
}

impl AccessToken {
    /// Check whether the token carries a specific scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
