//! Startup configuration for gated servers.
//!
//! Configuration is read once from `OAUTH_*` environment variables into an
//! [`AuthConfig`] value and passed by reference afterwards; nothing here is
//! re-read at request time. Defaults point at Google's OAuth2 endpoints,
//! matching the provider the demo servers are registered with.

use std::time::Duration;

use url::Url;

use crate::error::GateError;
use crate::introspection::DEFAULT_INTROSPECTION_TIMEOUT;

/// Default authorization server issuer.
pub const DEFAULT_ISSUER_URL: &str = "https://accounts.google.com";

/// Default token introspection endpoint (Google's `tokeninfo`).
pub const DEFAULT_INTROSPECTION_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Scope required of every token unless overridden.
pub const DEFAULT_REQUIRED_SCOPE: &str = "openid";

/// OAuth resource-server configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client ID tokens must be issued to (the expected audience).
    pub client_id: String,
    /// Subject emails permitted to call this server. Empty disables the
    /// allow-list check.
    pub allowed_emails: Vec<String>,
    /// Authorization server issuer, advertised in resource metadata.
    pub issuer_url: Url,
    /// Token introspection endpoint.
    pub introspection_url: Url,
    /// Scopes every verified token must carry.
    pub required_scopes: Vec<String>,
    /// Public URL clients use to reach this server.
    pub resource_url: Url,
    /// Bound on each introspection request.
    pub introspection_timeout: Duration,
}

impl AuthConfig {
    /// Configuration for `client_id` with the Google defaults.
    ///
    /// `resource_url` is the externally visible URL of this server; it
    /// feeds the RFC 9728 metadata document and the challenge headers.
    pub fn new(client_id: impl Into<String>, resource_url: Url) -> Self {
        Self {
            client_id: client_id.into(),
            allowed_emails: Vec::new(),
            issuer_url: Url::parse(DEFAULT_ISSUER_URL).expect("default issuer URL is valid"),
            introspection_url: Url::parse(DEFAULT_INTROSPECTION_URL)
                .expect("default introspection URL is valid"),
            required_scopes: vec![DEFAULT_REQUIRED_SCOPE.to_string()],
            resource_url,
            introspection_timeout: DEFAULT_INTROSPECTION_TIMEOUT,
        }
    }

    /// Read configuration from `OAUTH_*` environment variables.
    ///
    /// `OAUTH_CLIENT_ID` is required; everything else falls back to the
    /// Google defaults. `port` feeds the default resource URL
    /// (`http://localhost:{port}`) used when `RESOURCE_SERVER_URL` is
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::MissingConfig`] when `OAUTH_CLIENT_ID` is not
    /// set and [`GateError::InvalidUrl`] when a URL variable fails to
    /// parse.
    pub fn from_env(port: u16) -> Result<Self, GateError> {
        let client_id = std::env::var("OAUTH_CLIENT_ID")
            .map_err(|_| GateError::MissingConfig("OAUTH_CLIENT_ID"))?;

        let resource_url = match std::env::var("RESOURCE_SERVER_URL") {
            Ok(value) => parse_url("RESOURCE_SERVER_URL", &value)?,
            Err(_) => parse_url("RESOURCE_SERVER_URL", &format!("http://localhost:{port}"))?,
        };

        let mut config = Self::new(client_id, resource_url);

        if let Ok(value) = std::env::var("OAUTH_ALLOWED_EMAILS") {
            config.allowed_emails = split_csv(&value);
        }
        if let Ok(value) = std::env::var("OAUTH_ISSUER_URL") {
            config.issuer_url = parse_url("OAUTH_ISSUER_URL", &value)?;
        }
        if let Ok(value) = std::env::var("OAUTH_INTROSPECTION_URL") {
            config.introspection_url = parse_url("OAUTH_INTROSPECTION_URL", &value)?;
        }
        if let Ok(value) = std::env::var("OAUTH_REQUIRED_SCOPES") {
            config.required_scopes = split_csv(&value);
        }

        Ok(config)
    }

    /// Restrict callers to the given subject emails.
    pub fn with_allowed_emails(mut self, emails: impl IntoIterator<Item = String>) -> Self {
        self.allowed_emails = emails.into_iter().collect();
        self
    }

    /// Override the scopes required of every token.
    pub fn with_required_scopes(mut self, scopes: impl IntoIterator<Item = String>) -> Self {
        self.required_scopes = scopes.into_iter().collect();
        self
    }

    /// Override the introspection endpoint.
    pub fn with_introspection_url(mut self, url: Url) -> Self {
        self.introspection_url = url;
        self
    }

    /// Override the bound on introspection requests.
    pub fn with_introspection_timeout(mut self, timeout: Duration) -> Self {
        self.introspection_timeout = timeout;
        self
    }

    /// Resource identifier as advertised to clients, without a trailing
    /// slash.
    pub fn resource(&self) -> String {
        self.resource_url.as_str().trim_end_matches('/').to_string()
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, GateError> {
    Url::parse(value).map_err(|source| GateError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
