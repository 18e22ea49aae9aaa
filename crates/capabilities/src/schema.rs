//! Declarative input schemas for capabilities.
//!
//! A [`SchemaDescriptor`] lists the fields a capability accepts. It renders to a JSON Schema
//! object (advertised by `listTools`, enforced by the dispatcher) and carries the defaults
//! the dispatcher fills in before invoking a handler.

use crate::error::RegistryError;
use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;

/// Minimum Jaro similarity for a declared name to be offered as a "did you mean".
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// JSON type of a declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Boolean,
    Number,
    /// Array whose items have the given type.
    Array(Box<FieldType>),
    /// Object with an optional nested declaration.
    Object(Option<SchemaDescriptor>),
}

impl FieldType {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Array(item) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| item.accepts(v))),
            Self::Object(_) => value.is_object(),
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            Self::Array(item) => json!({ "type": "array", "items": item.to_json_schema() }),
            Self::Object(Some(nested)) => Value::Object(nested.to_json_schema()),
            other => json!({ "type": other.json_type() }),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub enum_values: Option<Vec<String>>,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl FieldSpec {
    fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required: true,
            enum_values: None,
            default: None,
            description: None,
        }
    }

    #[must_use]
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    #[must_use]
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    #[must_use]
    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    #[must_use]
    pub fn string_array(name: &str) -> Self {
        Self::new(name, FieldType::Array(Box::new(FieldType::String)))
    }

    #[must_use]
    pub fn object(name: &str, nested: Option<SchemaDescriptor>) -> Self {
        Self::new(name, FieldType::Object(nested))
    }

    /// A string field restricted to a fixed set of values.
    #[must_use]
    pub fn one_of(name: &str, values: &[&str]) -> Self {
        let mut field = Self::string(name);
        field.enum_values = Some(values.iter().map(|v| (*v).to_string()).collect());
        field
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Declare a default. A defaulted field is never required.
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = self.field_type.to_json_schema();
        if let Some(values) = &self.enum_values {
            schema["enum"] = json!(values);
        }
        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        if let Some(description) = &self.description {
            schema["description"] = json!(description);
        }
        schema
    }
}

/// One way a set of arguments fails its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Violation {
    /// An argument no field declares.
    #[serde(rename_all = "camelCase")]
    InvalidParameter {
        parameter: String,
        suggestions: Vec<String>,
        valid_parameters: Vec<String>,
    },
    MissingRequiredParameter { parameter: String },
    /// A value rejected by the JSON Schema (wrong type, value outside an enum).
    #[serde(rename_all = "camelCase")]
    ConstraintViolation {
        message: String,
        instance_path: String,
    },
}

/// Ordered set of field declarations for one capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescriptor {
    fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Render as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let mut required: Vec<&str> = Vec::new();

        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_json_schema());
            if field.required {
                required.push(&field.name);
            }
        }

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }

    /// Unknown and missing top-level arguments, unknown ones first.
    ///
    /// Value-level constraints are checked separately against the compiled JSON Schema.
    #[must_use]
    pub fn shape_violations(&self, args: &JsonObject) -> Vec<Violation> {
        let declared: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        let unknown = args
            .keys()
            .filter(|k| !declared.contains(&k.as_str()))
            .map(|k| Violation::InvalidParameter {
                parameter: k.clone(),
                suggestions: closest_names(k, &declared),
                valid_parameters: declared.iter().map(|d| (*d).to_string()).collect(),
            });
        let missing = self
            .fields
            .iter()
            .filter(|f| f.required && !args.contains_key(&f.name))
            .map(|f| Violation::MissingRequiredParameter {
                parameter: f.name.clone(),
            });

        unknown.chain(missing).collect()
    }

    /// Fill in declared defaults for absent (or `null`) top-level arguments.
    pub fn apply_defaults(&self, args: &mut JsonObject) {
        for field in &self.fields {
            let Some(default) = &field.default else {
                continue;
            };
            let missing = args.get(&field.name).is_none_or(Value::is_null);
            if missing {
                args.insert(field.name.clone(), default.clone());
            }
        }
    }

    /// Reject declarations that could never validate their own defaults.
    pub(crate) fn check(&self, capability: &str) -> Result<(), RegistryError> {
        let invalid = |message: String| RegistryError::InvalidSchema {
            name: capability.to_string(),
            message,
        };

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("field '{}' declared twice", field.name)));
            }
            let Some(default) = &field.default else {
                continue;
            };
            if !field.field_type.accepts(default) {
                return Err(invalid(format!(
                    "default for '{}' is not a {}",
                    field.name,
                    field.field_type.json_type()
                )));
            }
            if let (Some(values), Some(s)) = (&field.enum_values, default.as_str())
                && !values.iter().any(|v| v == s)
            {
                return Err(invalid(format!(
                    "default '{s}' for '{}' is not an allowed value",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

/// Declared names similar to `unknown`, most similar first.
fn closest_names(unknown: &str, declared: &[&str]) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = declared
        .iter()
        .map(|d| (strsim::jaro(unknown, d), *d))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, d)| d.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(FieldSpec::string("proposed_action"))
            .field(FieldSpec::string_array("affected_communities"))
            .field(
                FieldSpec::one_of("risk_tolerance", &["low", "moderate", "high"])
                    .default(json!("low")),
            )
            .field(FieldSpec::boolean("mitigation_required").default(json!(true)))
            .field(FieldSpec::string("notes").optional().describe("Free-form notes"))
    }

    #[test]
    fn json_schema_lists_required_fields_only() {
        let schema = Value::Object(sample().to_json_schema());
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(
            schema["required"],
            json!(["proposed_action", "affected_communities"])
        );
        assert_eq!(
            schema["properties"]["risk_tolerance"]["enum"],
            json!(["low", "moderate", "high"])
        );
        assert_eq!(schema["properties"]["risk_tolerance"]["default"], json!("low"));
        assert_eq!(
            schema["properties"]["affected_communities"]["items"],
            json!({ "type": "string" })
        );
        assert_eq!(
            schema["properties"]["notes"]["description"],
            json!("Free-form notes")
        );
    }

    #[test]
    fn properties_keep_declaration_order_when_serialized() {
        let schema = sample().to_json_schema();
        let keys: Vec<&str> = schema["properties"]
            .as_object()
            .expect("properties")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            [
                "proposed_action",
                "affected_communities",
                "risk_tolerance",
                "mitigation_required",
                "notes"
            ]
        );
        let text = serde_json::to_string(&schema).expect("serializes");
        let type_at = text.find("\"type\"").expect("type key");
        let properties_at = text.find("\"properties\"").expect("properties key");
        assert!(type_at < properties_at, "{text}");
    }

    #[test]
    fn schema_without_required_fields_omits_required_key() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::string("audit_period").optional())
            .to_json_schema();
        assert!(!schema.contains_key("required"));
    }

    #[test]
    fn apply_defaults_fills_missing_and_null_but_keeps_given_values() {
        let mut args = JsonObject::new();
        args.insert("risk_tolerance".to_string(), json!("high"));
        args.insert("mitigation_required".to_string(), Value::Null);

        sample().apply_defaults(&mut args);

        assert_eq!(args["risk_tolerance"], json!("high"));
        assert_eq!(args["mitigation_required"], json!(true));
        assert!(!args.contains_key("notes"));
    }

    #[test]
    fn shape_violations_report_unknown_then_missing() {
        let mut args = JsonObject::new();
        args.insert("proposed_acton".to_string(), json!("x"));

        let violations = sample().shape_violations(&args);
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0],
            Violation::InvalidParameter {
                parameter: "proposed_acton".to_string(),
                suggestions: vec!["proposed_action".to_string()],
                valid_parameters: vec![
                    "proposed_action".to_string(),
                    "affected_communities".to_string(),
                    "risk_tolerance".to_string(),
                    "mitigation_required".to_string(),
                    "notes".to_string(),
                ],
            }
        );
        assert_eq!(
            violations[1],
            Violation::MissingRequiredParameter {
                parameter: "proposed_action".to_string()
            }
        );
        assert_eq!(
            serde_json::to_value(&violations[2]).expect("serialize"),
            json!({ "type": "missing-required-parameter", "parameter": "affected_communities" })
        );
    }

    #[test]
    fn defaulted_fields_are_never_missing() {
        let mut args = JsonObject::new();
        args.insert("proposed_action".to_string(), json!("x"));
        args.insert("affected_communities".to_string(), json!([]));
        assert!(sample().shape_violations(&args).is_empty());
    }

    #[test]
    fn closest_names_ranks_by_similarity() {
        let names = closest_names("report_scop", &["report_scope", "reporter", "unrelated"]);
        assert_eq!(names.first().map(String::as_str), Some("report_scope"));
        assert!(!names.iter().any(|n| n == "unrelated"));
    }

    #[test]
    fn check_rejects_default_outside_enum() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::one_of("level", &["light", "maximum"]).default(json!("medium")));
        let err = schema.check("protect").unwrap_err();
        assert!(err.to_string().contains("not an allowed value"));
    }

    #[test]
    fn check_rejects_duplicate_fields() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::string("a"))
            .field(FieldSpec::boolean("a").optional());
        assert!(schema.check("dup").is_err());
    }

    #[test]
    fn nested_object_renders_properties() {
        let nested = SchemaDescriptor::new().field(FieldSpec::string("iwi").optional());
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::object("culturalContext", Some(nested)).optional())
            .to_json_schema();
        let ctx = &schema["properties"]["culturalContext"];
        assert_eq!(ctx["type"], json!("object"));
        assert_eq!(ctx["properties"]["iwi"]["type"], json!("string"));
    }
}
