//! MCP Server Implementation
//!
//! This module contains the transport side of the server:
//! - JSON-RPC 2.0 request/response structures
//! - Method dispatch shared by both transports
//! - HTTP server setup with Actix Web
//! - STDIO server implementation for line-based communication

use actix_web::{
    web, App, HttpServer, HttpResponse, Result,
    middleware::{Compress, Logger, DefaultHeaders},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use crate::core::config::ServerConfig;
use crate::core::random;
use crate::core::registry::{ToolError, ToolRegistry};
use crate::tools;

/// JSON-RPC error codes used by the server.
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Server metadata reported in `initialize` responses.
#[derive(Clone, Debug)]
pub struct AppState {
    pub server_name: String,
    pub server_version: String,
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
        }
    }
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// A request without an id is a notification and never gets a response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(MCPError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Build the registry with every tool registered.
///
/// The random source is seeded when `seed` is set, otherwise drawn from OS
/// entropy.
pub fn initialize_tools(seed: Option<u64>) -> Result<Arc<ToolRegistry>, ToolError> {
    let mut registry = ToolRegistry::new(random::from_seed(seed));
    tools::register_all(&mut registry)?;
    Ok(Arc::new(registry))
}

/// Parse one raw JSON-RPC message.
///
/// On failure the parse error response is returned instead, carrying the
/// request id when it can still be recovered from the raw text.
pub fn parse_request(raw: &[u8]) -> Result<MCPRequest, MCPResponse> {
    serde_json::from_slice(raw).map_err(|e| {
        warn!(error = %e, "unparsable JSON-RPC message");
        let id = serde_json::from_slice::<Value>(raw)
            .ok()
            .and_then(|partial| partial.get("id").cloned())
            .unwrap_or(Value::Null);
        MCPResponse::failure(id, PARSE_ERROR, format!("Parse error: {e}"))
    })
}

/// Route a request to its method handler.
///
/// Returns `None` for notifications.
pub fn handle_request(state: &AppState, registry: &ToolRegistry, req: MCPRequest) -> Option<MCPResponse> {
    let Some(id) = req.id else {
        debug!(method = %req.method, "notification received");
        return None;
    };

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, id, req.params),
        "ping" => MCPResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(registry, id),
        "tools/call" => handle_tools_call(registry, id, req.params),
        method => MCPResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {method}")),
    };
    Some(response)
}

/// Handle MCP initialize method.
///
/// Echoes the client's protocol version when supported, otherwise answers
/// with the newest revision this server knows.
fn handle_initialize(state: &AppState, id: Value, params: Option<Value>) -> MCPResponse {
    let requested = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);
    let version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);

    info!(client_version = ?requested, version, "client initialized");

    MCPResponse::success(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_tools_list(registry: &ToolRegistry, id: Value) -> MCPResponse {
    MCPResponse::success(id, json!({ "tools": registry.list() }))
}

/// Handle MCP tools/call method.
///
/// Unknown tools are protocol errors. Argument problems are reported as a
/// tool result with `isError` set so the caller's model can see them.
fn handle_tools_call(registry: &ToolRegistry, id: Value, params: Option<Value>) -> MCPResponse {
    let Some(tool_name) = params
        .as_ref()
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
    else {
        return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params");
    };

    let arguments = params
        .as_ref()
        .and_then(|p| p.get("arguments"))
        .cloned()
        .unwrap_or(Value::Null);

    match registry.invoke(tool_name, arguments) {
        Ok(text) => MCPResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": text }],
                "isError": false
            }),
        ),
        Err(e @ ToolError::NotFound { .. }) => MCPResponse::failure(id, INVALID_PARAMS, e.to_string()),
        Err(e) => MCPResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": format!("Error: {e}") }],
                "isError": true
            }),
        ),
    }
}

/// Health check endpoint handler.
async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": state.server_name
    })))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// Notifications are acknowledged with 202 and an empty body.
async fn mcp_handler(
    state: web::Data<AppState>,
    registry: web::Data<ToolRegistry>,
    counter: web::Data<AtomicU64>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    // Only atomicity matters for the counter.
    counter.fetch_add(1, Ordering::Relaxed);

    let response = match parse_request(&body) {
        Ok(req) => handle_request(&state, &registry, req),
        Err(parse_error) => Some(parse_error),
    };

    Ok(match response {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    })
}

/// Total number of MCP requests processed since server start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// Server-Sent Events endpoint for tools discovery.
///
/// Emits a single event carrying the same tool list as `tools/list`.
async fn sse_tools_discovery(registry: web::Data<ToolRegistry>) -> Result<HttpResponse> {
    use actix_web::http::header;

    let tools = registry.list();
    let tools_data = json!({
        "tools": tools,
        "count": tools.len()
    });

    let sse_data = format!(
        "data: {}\n\n",
        serde_json::to_string(&tools_data).unwrap_or_else(|_| "{}".to_string())
    );

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering
        .insert_header(("x-accel-buffering", "no"))
        .body(sse_data))
}

/// Route table for the HTTP transport.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/sse", web::get().to(sse_tools_discovery))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// - Worker threads: from `ServerConfig::workers`
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive and request timeout: 30 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(
    config: &ServerConfig,
    state: AppState,
    registry: Arc<ToolRegistry>,
) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    let app_state = web::Data::new(state);
    let tool_registry = web::Data::from(registry);
    let request_count = web::Data::new(AtomicU64::new(0));

    info!(
        name = %app_state.server_name,
        version = %app_state.server_version,
        bind = %bind_addr,
        workers = config.workers,
        tools = tool_registry.list().len(),
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            .app_data(request_count.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC messages line by line from stdin and writes responses to
/// stdout. Logging goes to stderr so it never interleaves with the protocol
/// stream.
pub async fn run_server_stdio(state: AppState, registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    info!(
        name = %state.server_name,
        version = %state.server_version,
        tools = registry.list().len(),
        "MCP server starting (STDIO mode)"
    );

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = BufWriter::with_capacity(8192, tokio::io::stdout());
    serve_lines(stdin, stdout, &state, &registry).await
}

/// Serve line-delimited JSON-RPC until `reader` reaches EOF.
///
/// Requests are processed one at a time. Each response is written on its own
/// line and flushed immediately.
pub async fn serve_lines<R, W>(
    reader: R,
    mut writer: W,
    state: &AppState,
    registry: &ToolRegistry,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match parse_request(line.as_bytes()) {
            Ok(req) => handle_request(state, registry, req),
            Err(parse_error) => Some(parse_error),
        };
        let Some(response) = response else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                continue;
            }
        };

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    info!("stdin closed, STDIO transport stopping");
    Ok(())
}
