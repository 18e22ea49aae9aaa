//! Read-only documents exposed next to capabilities.

use crate::error::{DispatchError, RegistryError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

const JSON_MIME_TYPE: &str = "application/json";

/// Where a resource's document comes from.
#[derive(Clone)]
pub enum ResourceBody {
    /// Fixed document built at startup.
    Static(Value),
    /// Snapshot rendered on every read.
    Dynamic(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl fmt::Debug for ResourceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct ResourceEntry {
    descriptor: ResourceDescriptor,
    body: ResourceBody,
}

/// Public view of a resource, as returned by `listResources`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// One rendered resource document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

/// Resources keyed by URI, listed in registration order.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    entries: Vec<ResourceEntry>,
}

impl ResourceCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource with the same URI already exists.
    pub fn register(
        &mut self,
        uri: &str,
        name: &str,
        description: &str,
        body: ResourceBody,
    ) -> Result<(), RegistryError> {
        if self.entries.iter().any(|e| e.descriptor.uri == uri) {
            return Err(RegistryError::DuplicateResource(uri.to_string()));
        }
        self.entries.push(ResourceEntry {
            descriptor: ResourceDescriptor {
                uri: uri.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                mime_type: JSON_MIME_TYPE.to_string(),
            },
            body,
        });
        Ok(())
    }

    #[must_use]
    pub fn list(&self) -> Vec<ResourceDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Render a resource as pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownResource`] if no resource has this URI.
    pub fn read(&self, uri: &str) -> Result<ReadResourceResult, DispatchError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.uri == uri)
            .ok_or_else(|| DispatchError::UnknownResource(uri.to_string()))?;

        let document = match &entry.body {
            ResourceBody::Static(v) => v.clone(),
            ResourceBody::Dynamic(render) => render(),
        };
        let text = serde_json::to_string_pretty(&document).map_err(|e| DispatchError::Internal {
            message: format!("failed to render resource '{uri}': {e}"),
        })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: entry.descriptor.uri.clone(),
                mime_type: entry.descriptor.mime_type.clone(),
                text,
            }],
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
