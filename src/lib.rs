//! # mcp-tokengate
//!
//! OAuth2 token-introspection gate for MCP tool servers.
//!
//! The gate sits in front of an MCP server's HTTP transport and checks
//! every bearer token against an identity provider's introspection
//! endpoint (Google's `tokeninfo` by default) before a request may reach
//! the protocol layer. The decision is fail-closed: a token passes only
//! when introspection succeeds, the provider reports no error, the
//! token's audience matches this server's OAuth client ID, and, when an
//! allow-list is configured, the subject email is listed. Every other
//! outcome answers the same way, so callers cannot probe for why a token
//! was turned away.
//!
//! ## Design
//!
//! The gate is ordinary Tower middleware, so it composes with axum and
//! any other Tower-based stack:
//!
//! - [`TokenVerifier`] is the decision seam: token in, `Option<AccessToken>`
//!   out. [`IntrospectionVerifier`] is the production implementation;
//!   [`StaticTokenVerifier`] serves demos and tests.
//! - [`TokenIntrospecter`] isolates the remote call so verification logic
//!   is testable without a network.
//! - [`TokenGateLayer`] wires a verifier into the request path, answering
//!   rejected requests with RFC 6750 challenges.
//! - [`metadata_router`] serves the RFC 9728 document that tells clients
//!   which authorization server to use.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcp_tokengate::{
//!     metadata_router, AuthConfig, IntrospectionVerifier, ProtectedResourceMetadata,
//!     ScopeRequirement, TokenGateLayer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AuthConfig::from_env(8080)?;
//!     let verifier = IntrospectionVerifier::from_config(&config)?;
//!     let metadata = ProtectedResourceMetadata::from_config(&config);
//!
//!     let gate = TokenGateLayer::new(verifier)
//!         .resource_metadata_url(metadata.document_url())
//!         .required_scopes(ScopeRequirement::all(config.required_scopes.iter().cloned()));
//!
//!     let app = axum::Router::new()
//!         // .nest_service("/mcp", your_mcp_service)
//!         .merge(metadata_router(metadata))
//!         .layer(gate);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! Handlers behind the gate can read the verified record from the request
//! extensions as an [`AccessToken`].
//!
//! ## Key Types
//!
//! - [`AuthConfig`]: startup configuration from `OAUTH_*` environment
//!   variables
//! - [`TokenVerifier`] / [`IntrospectionVerifier`]: the admission decision
//! - [`TokenGateLayer`] / [`TokenGateService`]: the Tower middleware
//! - [`ProtectedResourceMetadata`]: the RFC 9728 discovery document
//! - [`AuthChallenge`]: rejection rendered as a `WWW-Authenticate` header

pub mod config;
pub mod error;
pub mod introspection;
pub mod metadata;
pub mod middleware;
pub mod scope;
pub mod token;
pub mod verifier;

pub use config::AuthConfig;
pub use error::{AuthChallenge, BoxError, GateError};
pub use introspection::{HttpIntrospecter, TokenInfo, TokenIntrospecter};
pub use metadata::{metadata_router, ProtectedResourceMetadata};
pub use middleware::{extract_bearer_token, TokenGateLayer, TokenGateService};
pub use scope::ScopeRequirement;
pub use token::AccessToken;
pub use verifier::{IntrospectionVerifier, StaticTokenVerifier, TokenVerifier};
