//! Token verification: the gate's admission decision.
//!
//! A [`TokenVerifier`] answers one question: may the bearer of this token
//! proceed? The answer is a full [`AccessToken`] record or `None`, nothing
//! in between. Rejection reasons are logged server-side but never returned,
//! so a probing client cannot distinguish a forged token from a revoked one
//! or from a provider outage.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::AuthConfig;
use crate::error::GateError;
use crate::introspection::{HttpIntrospecter, TokenIntrospecter};
use crate::token::AccessToken;

/// Decides whether a presented bearer token may proceed.
///
/// Implementations must be cheaply cloneable; the middleware clones the
/// verifier into each request future.
///
/// # Example
///
/// ```rust
/// use mcp_tokengate::{AccessToken, TokenVerifier};
///
/// /// Accepts any token during local development.
/// #[derive(Clone)]
/// struct AcceptAll;
///
/// impl TokenVerifier for AcceptAll {
///     async fn verify(&self, token: &str) -> Option<AccessToken> {
///         Some(AccessToken {
///             token: token.to_string(),
///             client_id: "dev".to_string(),
///             scopes: Default::default(),
///             expires_at: None,
///         })
///     }
/// }
/// ```
pub trait TokenVerifier: Clone + Send + Sync + 'static {
    /// Validate `token`, returning its record when it is acceptable.
    ///
    /// Every failure mode answers `None`; callers must not be able to
    /// learn why a token was turned away.
    fn verify(&self, token: &str) -> impl Future<Output = Option<AccessToken>> + Send;
}

/// Verifier that asks an OAuth2 introspection endpoint about each token.
///
/// The decision is fail-closed, in order:
///
/// 1. introspection must succeed (transport or decode failure rejects);
/// 2. the provider must not have flagged the token (`error` field);
/// 3. the token's audience must equal the configured client ID;
/// 4. when an allow-list is set, the subject email must be listed.
///
/// Only then is an [`AccessToken`] built from the provider's answer.
#[derive(Debug, Clone)]
pub struct IntrospectionVerifier<I> {
    introspecter: I,
    client_id: Arc<str>,
    allowed_subjects: Arc<HashSet<String>>,
}

impl<I> IntrospectionVerifier<I> {
    /// Create a verifier that accepts tokens issued to `client_id`.
    pub fn new(introspecter: I, client_id: impl Into<Arc<str>>) -> Self {
        Self {
            introspecter,
            client_id: client_id.into(),
            allowed_subjects: Arc::new(HashSet::new()),
        }
    }

    /// Restrict verification to tokens whose subject email is listed.
    ///
    /// An empty list leaves the check disabled.
    pub fn allowed_subjects(mut self, subjects: impl IntoIterator<Item = String>) -> Self {
        self.allowed_subjects = Arc::new(subjects.into_iter().collect());
        self
    }

    /// The client ID tokens must be issued to.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl IntrospectionVerifier<HttpIntrospecter> {
    /// Build the production verifier described by `config`.
    pub fn from_config(config: &AuthConfig) -> Result<Self, GateError> {
        let introspecter = HttpIntrospecter::with_timeout(
            config.introspection_url.clone(),
            config.introspection_timeout,
        )?;
        Ok(Self::new(introspecter, config.client_id.as_str())
            .allowed_subjects(config.allowed_emails.iter().cloned()))
    }
}

impl<I: TokenIntrospecter> TokenVerifier for IntrospectionVerifier<I> {
    async fn verify(&self, token: &str) -> Option<AccessToken> {
        let info = match self.introspecter.introspect(token).await {
            Ok(info) => info,
            Err(err) => {
                error!(error = %err, "token introspection failed, rejecting");
                return None;
            }
        };

        if let Some(code) = info.error.as_deref() {
            warn!(error = code, "provider rejected token");
            return None;
        }

        let aud = info.aud.as_deref().unwrap_or_default();
        if aud != self.client_id.as_ref() {
            warn!(audience = aud, "token audience does not match this server");
            return None;
        }

        if !self.allowed_subjects.is_empty() {
            let subject = info.email.as_deref();
            match subject {
                Some(email) if self.allowed_subjects.contains(email) => {}
                _ => {
                    warn!(
                        subject = subject.unwrap_or("<none>"),
                        "token subject is not allow-listed"
                    );
                    return None;
                }
            }
        }

        debug!(client_id = aud, "token verified");
        Some(AccessToken {
            token: token.to_string(),
            client_id: aud.to_string(),
            scopes: info.scopes(),
            expires_at: info.exp,
        })
    }
}

/// Verifier backed by a fixed token table, for demos and tests.
///
/// Unknown tokens are rejected; known tokens return their stored record.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    tokens: Arc<HashMap<String, AccessToken>>,
}

impl StaticTokenVerifier {
    /// Create a verifier accepting exactly the given records, keyed by
    /// their raw token strings.
    pub fn new(tokens: impl IntoIterator<Item = AccessToken>) -> Self {
        Self {
            tokens: Arc::new(
                tokens
                    .into_iter()
                    .map(|record| (record.token.clone(), record))
                    .collect(),
            ),
        }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<AccessToken> {
        self.tokens.get(token).cloned()
    }
}
