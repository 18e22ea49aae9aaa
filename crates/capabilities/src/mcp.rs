//! MCP server view of a [`Toolkit`].
//!
//! `tools/list`, `tools/call`, `resources/list` and `resources/read` go through the same
//! registry, schema checks and catalog as the `{type, params}` and `{operation, arguments}`
//! request shapes, so every transport sees identical results and error codes.

use crate::dispatch::Toolkit;
use crate::error::DispatchError;
use crate::resources;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use rmcp::model::{
    AnnotateAble as _, CallToolRequestParams, CallToolResult, ErrorCode, Implementation,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, ProtocolVersion, RawResource,
    ReadResourceRequestParams, ReadResourceResult, ResourceContents, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use std::sync::Arc;

impl From<DispatchError> for McpError {
    fn from(e: DispatchError) -> Self {
        let data = e.data().cloned();
        Self::new(ErrorCode(e.code()), e.to_string(), data)
    }
}

/// Serves one toolkit to MCP clients.
#[derive(Debug, Clone)]
pub struct McpSurface {
    toolkit: Arc<Toolkit>,
}

impl McpSurface {
    #[must_use]
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self { toolkit }
    }

    fn tools(&self) -> Vec<Tool> {
        self.toolkit
            .registry
            .list()
            .into_iter()
            .map(|d| Tool::new(d.name, d.description, d.input_schema))
            .collect()
    }
}

fn to_mcp_contents(read: resources::ReadResourceResult) -> Vec<ResourceContents> {
    read.contents
        .into_iter()
        .map(|c| ResourceContents::TextResourceContents {
            uri: c.uri,
            mime_type: Some(c.mime_type),
            text: c.text,
            meta: None,
        })
        .collect()
}

impl ServerHandler for McpSurface {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.toolkit.info.name.clone(),
                version: self.toolkit.info.version.clone(),
                ..Implementation::default()
            },
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools().into_iter().find(|t| t.name == name)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(serde_json::Value::Object);
        Ok(self.toolkit.call(&request.name, arguments).await?)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .toolkit
            .resources
            .list()
            .into_iter()
            .map(|d| {
                let mut raw = RawResource::new(d.uri, d.name);
                raw.description = Some(d.description);
                raw.mime_type = Some(d.mime_type);
                raw.no_annotation()
            })
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let read = self.toolkit.resources.read(&request.uri)?;
        Ok(ReadResourceResult {
            contents: to_mcp_contents(read),
        })
    }
}
