//! Capability registry.

use crate::error::RegistryError;
use crate::schema::SchemaDescriptor;
use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Uniform contract implemented by every capability handler.
///
/// Arguments have already been validated against the capability's schema and had their
/// defaults applied by the time `handle` runs.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, args: &JsonObject) -> anyhow::Result<CallToolResult>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&JsonObject) -> anyhow::Result<CallToolResult> + Send + Sync,
{
    async fn handle(&self, args: &JsonObject) -> anyhow::Result<CallToolResult> {
        self(args)
    }
}

/// A registered, named operation.
pub struct Capability {
    pub name: String,
    pub description: String,
    pub schema: SchemaDescriptor,
    pub handler: Arc<dyn Handler>,
    /// `schema` rendered once at registration.
    pub input_schema: JsonObject,
    /// `input_schema` compiled once at registration.
    pub(crate) validator: jsonschema::Validator,
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Public view of a capability (handler excluded), as returned by `listTools`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonObject,
}

/// Fixed set of named operations for one endpoint.
///
/// Registration happens while a toolkit is being assembled; afterwards the registry is
/// shared behind an `Arc` and only read.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// Registration order, used by `list`.
    entries: Vec<Capability>,
    /// Name -> index into `entries`.
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered or the schema is inconsistent.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        schema: SchemaDescriptor,
        handler: impl Handler + 'static,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateCapability(name.to_string()));
        }
        schema.check(name)?;
        let input_schema = schema.to_json_schema();
        let validator = jsonschema::validator_for(&Value::Object(input_schema.clone())).map_err(
            |e| RegistryError::InvalidSchema {
                name: name.to_string(),
                message: e.to_string(),
            },
        )?;

        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(Capability {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler: Arc::new(handler),
            input_schema,
            validator,
        });
        Ok(())
    }

    /// Register a plain function or closure as a capability.
    ///
    /// # Errors
    ///
    /// Same as [`CapabilityRegistry::register`].
    pub fn register_fn<F>(
        &mut self,
        name: &str,
        description: &str,
        schema: SchemaDescriptor,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&JsonObject) -> anyhow::Result<CallToolResult> + Send + Sync + 'static,
    {
        self.register(name, description, schema, handler)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn list(&self) -> Vec<CapabilityDescriptor> {
        self.entries
            .iter()
            .map(|c| CapabilityDescriptor {
                name: c.name.clone(),
                description: c.description.clone(),
                input_schema: c.input_schema.clone(),
            })
            .collect()
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
