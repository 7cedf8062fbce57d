//! Arithmetic MCP server behind the OAuth2 token gate.
//!
//! Exposes add, subtract, multiply, divide and a 2D distance tool over
//! streamable HTTP (gated) or stdio (local, ungated). Run with
//! `--insecure` to serve HTTP without token verification during
//! development.

use anyhow::Context as _;
use clap::Parser;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::{
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use tracing_subscriber::EnvFilter;

use mcp_tokengate::{
    metadata_router, AuthConfig, IntrospectionVerifier, ProtectedResourceMetadata,
    ScopeRequirement, TokenGateLayer,
};

#[derive(Parser)]
#[command(
    name = "math-server",
    about = "Arithmetic MCP server behind an OAuth2 token gate"
)]
struct Args {
    /// Transport to serve: "stdio" or "http"
    #[arg(long, default_value = "http")]
    transport: String,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Serve HTTP without token verification (development only)
    #[arg(long)]
    insecure: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct BinaryOperands {
    /// First operand
    a: i64,
    /// Second operand
    b: i64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct Point {
    /// X coordinate
    x: f64,
    /// Y coordinate
    y: f64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct DistanceArgs {
    /// First point
    p1: Point,
    /// Second point
    p2: Point,
}

#[derive(Clone)]
struct MathServer {
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MathServer {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Add two numbers")]
    fn add(&self, Parameters(BinaryOperands { a, b }): Parameters<BinaryOperands>) -> String {
        (a + b).to_string()
    }

    #[tool(description = "Subtract the second number from the first")]
    fn subtract(&self, Parameters(BinaryOperands { a, b }): Parameters<BinaryOperands>) -> String {
        (a - b).to_string()
    }

    #[tool(description = "Multiply two numbers")]
    fn multiply(&self, Parameters(BinaryOperands { a, b }): Parameters<BinaryOperands>) -> String {
        (a * b).to_string()
    }

    #[tool(description = "Divide the first number by the second")]
    fn divide(
        &self,
        Parameters(BinaryOperands { a, b }): Parameters<BinaryOperands>,
    ) -> Result<CallToolResult, McpError> {
        if b == 0 {
            return Err(McpError::invalid_params("Cannot divide by zero", None));
        }
        Ok(CallToolResult::success(vec![Content::text(
            (a as f64 / b as f64).to_string(),
        )]))
    }

    #[tool(description = "Euclidean distance between two points in 2D space")]
    fn distance(&self, Parameters(DistanceArgs { p1, p2 }): Parameters<DistanceArgs>) -> String {
        (p1.x - p2.x).hypot(p1.y - p2.y).to_string()
    }
}

#[tool_handler]
impl ServerHandler for MathServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Basic arithmetic tools: add, subtract, multiply, divide, and the distance \
                 between two 2D points."
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
    tracing::info!("math server speaking MCP on stdio");
    let service = MathServer::new().serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

async fn serve_http(args: &Args) -> anyhow::Result<()> {
    let mcp_service = StreamableHttpService::new(
        || Ok(MathServer::new()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let app = if args.insecure {
        tracing::warn!("token verification disabled, every caller is trusted");
        axum::Router::new().nest_service("/mcp", mcp_service)
    } else {
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

        axum::Router::new()
            .nest_service("/mcp", mcp_service)
            .merge(metadata_router(metadata))
            .layer(gate)
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("math server listening on http://{addr}/mcp");
    axum::serve(listener, app).await?;
    Ok(())
}
