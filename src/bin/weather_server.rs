//! Weather MCP server behind the OAuth2 token gate.
//!
//! Exposes a single `get_weather` tool returning canned data, enough to
//! demonstrate a gated tool call end to end without a weather-provider
//! account. Serves streamable HTTP (gated) or stdio (local, ungated).

use anyhow::Context as _;
use clap::Parser;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use tracing_subscriber::EnvFilter;

use mcp_tokengate::{
    metadata_router, AuthConfig, IntrospectionVerifier, ProtectedResourceMetadata,
    ScopeRequirement, TokenGateLayer,
};

#[derive(Parser)]
#[command(
    name = "weather-server",
    about = "Weather MCP server behind an OAuth2 token gate"
)]
struct Args {
    /// Transport to serve: "stdio" or "http"
    #[arg(long, default_value = "http")]
    transport: String,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct WeatherArgs {
    /// City to report weather for
    #[serde(default = "default_city")]
    city: String,
}

fn default_city() -> String {
    "London".to_string()
}

#[derive(Clone)]
struct WeatherServer {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WeatherServer {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get weather data for a city")]
    fn get_weather(&self, Parameters(WeatherArgs { city }): Parameters<WeatherArgs>) -> String {
        // Canned data, no upstream weather provider is involved.
        serde_json::json!({
            "city": city,
            "temperature": "22",
            "condition": "Partly cloudy",
            "humidity": "65%",
        })
        .to_string()
    }
}

#[tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Weather lookup for a city. Reports temperature, condition, and humidity."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries JSON-RPC on the stdio transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mcp_tokengate=debug".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match args.transport.as_str() {
        "stdio" => serve_stdio().await,
        "http" => serve_http(&args).await,
        other => anyhow::bail!("unknown transport: {other} (expected \"stdio\" or \"http\")"),
    }
}

async fn serve_stdio() -> anyhow::Result<()> {
    tracing::info!("weather server speaking MCP on stdio");
    let service = WeatherServer::new().serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

async fn serve_http(args: &Args) -> anyhow::Result<()> {
    let config = AuthConfig::from_env(args.port).context("loading OAuth configuration")?;
    let verifier = IntrospectionVerifier::from_config(&config)?;
    let metadata = ProtectedResourceMetadata::from_config(&config);

    tracing::info!(
        client_id = %config.client_id,
        issuer = %config.issuer_url,
        allowed_emails = config.allowed_emails.len(),
        "token gate enabled"
    );

    let gate = TokenGateLayer::new(verifier)
        .resource_metadata_url(metadata.document_url())
        .required_scopes(ScopeRequirement::all(config.required_scopes.iter().cloned()));

    let mcp_service = StreamableHttpService::new(
        || Ok(WeatherServer::new()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let app = axum::Router::new()
        .nest_service("/mcp", mcp_service)
        .merge(metadata_router(metadata))
        .layer(gate);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("weather server listening on http://{addr}/mcp");
    axum::serve(listener, app).await?;
    Ok(())
}
