//! Request dispatch: operation name + arguments -> handler result.

use crate::error::{DispatchError, Result};
use crate::registry::{Capability, CapabilityRegistry};
use crate::resources::ResourceCatalog;
use crate::schema::Violation;
use jsonschema::error::ValidationErrorKind;
use rmcp::model::{CallToolResult, JsonObject};
use serde::Serialize;
use serde_json::{Value, json};

/// Name and version advertised by a toolkit.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// One endpoint family: its capabilities, resources and identity.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct Toolkit {
    pub info: ServerInfo,
    pub registry: CapabilityRegistry,
    pub resources: ResourceCatalog,
}

/// Sub-protocol selector of a `{type, params}` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryKind {
    ListResources,
    ReadResource,
    ListTools,
    CallTool,
}

impl DiscoveryKind {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "listResources" => Some(Self::ListResources),
            "readResource" => Some(Self::ReadResource),
            "listTools" => Some(Self::ListTools),
            "callTool" => Some(Self::CallTool),
            _ => None,
        }
    }
}

impl Toolkit {
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            info: ServerInfo {
                name: name.to_string(),
                version: version.to_string(),
            },
            registry: CapabilityRegistry::new(),
            resources: ResourceCatalog::new(),
        }
    }

    /// Dispatch one operation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownOperation`] for unregistered names,
    /// [`DispatchError::InvalidParams`] when the arguments violate the schema and
    /// [`DispatchError::Internal`] when the handler fails.
    pub async fn call(&self, operation: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        let capability = self
            .registry
            .get(operation)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_string()))?;

        let mut args = arguments_object(arguments)?;
        validate_arguments(capability, &args)?;
        capability.schema.apply_defaults(&mut args);

        capability.handler.handle(&args).await.map_err(|e| {
            tracing::error!(
                toolkit = %self.info.name,
                operation = %operation,
                error = ?e,
                "capability handler failed"
            );
            DispatchError::Internal {
                message: e.to_string(),
            }
        })
    }

    /// Serve one discovery request (`listTools`, `listResources`, `readResource`, `callTool`).
    ///
    /// # Errors
    ///
    /// Propagates dispatch errors; missing `uri`/`name` params are reported as invalid params.
    pub async fn discover(&self, kind: DiscoveryKind, params: Option<Value>) -> Result<Value> {
        let params = match params {
            Some(Value::Object(map)) => map,
            _ => JsonObject::new(),
        };

        match kind {
            DiscoveryKind::ListTools => Ok(json!({ "tools": self.registry.list() })),
            DiscoveryKind::ListResources => Ok(json!({ "resources": self.resources.list() })),
            DiscoveryKind::ReadResource => {
                let uri = required_str_param(&params, "uri")?;
                to_json(&self.resources.read(uri)?)
            }
            DiscoveryKind::CallTool => {
                let name = required_str_param(&params, "name")?;
                let result = self.call(name, params.get("arguments").cloned()).await?;
                to_json(&result)
            }
        }
    }
}

fn arguments_object(arguments: Option<Value>) -> Result<JsonObject> {
    match arguments {
        None | Some(Value::Null) => Ok(JsonObject::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(DispatchError::InvalidParams {
            message: "Invalid params: arguments must be an object".to_string(),
            data: json!({ "type": "validation-errors", "violations": [] }),
        }),
    }
}

fn required_str_param<'a>(params: &'a JsonObject, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidParams {
            message: format!("Invalid params: missing '{key}'"),
            data: json!({
                "type": "validation-errors",
                "violations": [{ "type": "missing-required-parameter", "parameter": key }],
            }),
        })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal {
        message: format!("failed to serialize result: {e}"),
    })
}

/// Check arguments against the capability's schema: unknown and missing fields from the
/// declaration, value constraints from the compiled JSON Schema.
fn validate_arguments(capability: &Capability, args: &JsonObject) -> Result<()> {
    let mut violations = capability.schema.shape_violations(args);

    let instance = Value::Object(args.clone());
    violations.extend(
        capability
            .validator
            .iter_errors(&instance)
            // Missing fields are already reported by name.
            .filter(|e| !matches!(e.kind(), ValidationErrorKind::Required { .. }))
            .map(|e| Violation::ConstraintViolation {
                message: e.to_string(),
                instance_path: e.instance_path().to_string(),
            }),
    );

    if violations.is_empty() {
        return Ok(());
    }
    Err(DispatchError::InvalidParams {
        message: summarize(&violations),
        data: json!({
            "type": "validation-errors",
            "violations": violations,
        }),
    })
}

fn summarize(violations: &[Violation]) -> String {
    let unknown = violations.iter().find_map(|v| match v {
        Violation::InvalidParameter {
            parameter,
            suggestions,
            ..
        } => Some((parameter, suggestions.first())),
        _ => None,
    });
    match unknown {
        Some((p, Some(s))) => {
            format!("Invalid params: unknown parameter '{p}' (did you mean '{s}'?)")
        }
        Some((p, None)) => format!("Invalid params: unknown parameter '{p}'"),
        None => format!(
            "Invalid params: validation failed with {} error(s)",
            violations.len()
        ),
    }
}
