use super::parse_body;
use crate::error::ApiError;
use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, post};
use rise_capabilities::mcp::McpSurface;
use rise_capabilities::{DiscoveryKind, Toolkit};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Largest request body read before deciding which protocol it speaks.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type McpService = StreamableHttpService<McpSurface, LocalSessionManager>;

/// The two body shapes a toolkit endpoint accepts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolkitRequest {
    /// `{type, params}`: `listTools`, `listResources`, `readResource` or `callTool`.
    Discovery {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        params: Option<Value>,
    },
    /// `{operation, arguments}`: call one capability directly.
    Direct {
        operation: String,
        #[serde(default)]
        arguments: Option<Value>,
    },
}

pub fn endpoint(toolkit: Arc<Toolkit>) -> MethodRouter {
    post(move |body: Bytes| {
        let toolkit = Arc::clone(&toolkit);
        async move { handle(&toolkit, &body).await }
    })
}

/// Like [`endpoint`], but JSON-RPC messages (bodies carrying `jsonrpc`) are answered by
/// the toolkit's MCP server over streamable HTTP.
///
/// The MCP side is stateless: every POST is served on its own and no session is kept.
pub fn endpoint_with_mcp(toolkit: Arc<Toolkit>) -> MethodRouter {
    let mcp = mcp_service(Arc::clone(&toolkit));
    post(move |request: Request| {
        let toolkit = Arc::clone(&toolkit);
        let mcp = mcp.clone();
        async move { handle_either(&toolkit, &mcp, request).await }
    })
}

fn mcp_service(toolkit: Arc<Toolkit>) -> McpService {
    StreamableHttpService::new(
        move || Ok(McpSurface::new(Arc::clone(&toolkit))),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: false,
            sse_keep_alive: None,
            sse_retry: None,
            ..StreamableHttpServerConfig::default()
        },
    )
}

async fn handle_either(toolkit: &Toolkit, mcp: &McpService, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read toolkit request body");
            return ApiError::InvalidJson.into_response();
        }
    };

    let raw: Value = match parse_body(&bytes) {
        Ok(raw) => raw,
        Err(e) => return e.into_response(),
    };
    if raw.get("jsonrpc").is_some() {
        let request = Request::from_parts(parts, Body::from(bytes));
        return mcp.handle(request).await.into_response();
    }

    match dispatch(toolkit, raw).await {
        Ok(json) => json.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle(toolkit: &Toolkit, body: &[u8]) -> Result<Json<Value>, ApiError> {
    dispatch(toolkit, parse_body(body)?).await
}

async fn dispatch(toolkit: &Toolkit, raw: Value) -> Result<Json<Value>, ApiError> {
    let request = ToolkitRequest::deserialize(raw).map_err(|_| ApiError::UnknownApiType)?;

    let result = match request {
        ToolkitRequest::Discovery { kind, params } => {
            let kind = DiscoveryKind::parse(&kind).ok_or(ApiError::UnknownApiType)?;
            toolkit.discover(kind, params).await?
        }
        ToolkitRequest::Direct {
            operation,
            arguments,
        } => {
            let result = toolkit.call(&operation, arguments).await?;
            serde_json::to_value(result).map_err(|e| {
                ApiError::Dispatch(rise_capabilities::DispatchError::Internal {
                    message: format!("failed to serialize result: {e}"),
                })
            })?
        }
    };
    Ok(Json(result))
}
