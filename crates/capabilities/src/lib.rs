//! Capability registry, request dispatcher and toolkits for the RISE survey API.
//!
//! This crate is transport-free: `rise-survey-api` mounts each [`toolkits::MountedToolkit`]
//! under `/api/<slug>` and translates [`error::DispatchError`] into HTTP responses.
//! [`mcp::McpSurface`] exposes the same toolkits to MCP clients.

pub mod audit;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod toolkits;

pub use dispatch::{DiscoveryKind, Toolkit};
pub use error::{DispatchError, RegistryError};
