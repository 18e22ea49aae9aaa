//! Error types for capability registration and dispatch.

use rmcp::model::ErrorCode;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while assembling a registry.
///
/// These are programmer errors: toolkits are built once at startup and a failure here
/// aborts the process.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A capability with this name was already registered.
    #[error("duplicate capability '{0}'")]
    DuplicateCapability(String),

    /// A resource with this URI was already registered.
    #[error("duplicate resource '{0}'")]
    DuplicateResource(String),

    /// A schema declaration is internally inconsistent.
    #[error("invalid schema for '{name}': {message}")]
    InvalidSchema { name: String, message: String },
}

/// Errors surfaced by the request dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No capability with this name exists in the registry.
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// No resource with this URI exists in the catalog.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Arguments were rejected by the capability's schema.
    #[error("{message}")]
    InvalidParams { message: String, data: Value },

    /// The handler failed.
    ///
    /// The full error chain is logged by the dispatcher; only the top-level message is kept.
    #[error("{message}")]
    Internal { message: String },
}

impl DispatchError {
    /// JSON-RPC style error code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownOperation(_) => ErrorCode::METHOD_NOT_FOUND.0,
            Self::UnknownResource(_) => ErrorCode::RESOURCE_NOT_FOUND.0,
            Self::InvalidParams { .. } => ErrorCode::INVALID_PARAMS.0,
            Self::Internal { .. } => ErrorCode::INTERNAL_ERROR.0,
        }
    }

    /// Structured detail attached to the error, if any.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::InvalidParams { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Result type alias for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
