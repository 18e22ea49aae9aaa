//! The endpoint families served by the API.
//!
//! Every toolkit is assembled once at startup. Handlers return canned acknowledgement text;
//! the frameworks exposed as resources are static descriptive data, not decision logic.

pub mod ai_safety;
pub mod community_feedback;
pub mod cultural_competence;
pub mod cultural_compliance;
pub mod data_sovereignty;
pub mod participant_consent;

use crate::audit::AuditLog;
use crate::dispatch::Toolkit;
use crate::error::RegistryError;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A toolkit together with the URL path segment it is served under.
#[derive(Debug, Clone)]
pub struct MountedToolkit {
    pub slug: &'static str,
    pub toolkit: Arc<Toolkit>,
    /// Also answers MCP JSON-RPC messages on the same path.
    pub speaks_mcp: bool,
}

/// Build every toolkit.
///
/// Each toolkit that keeps an audit trail gets its own log bounded by `audit_capacity`
/// and `audit_window`, so traffic on one endpoint never evicts another's records.
///
/// # Errors
///
/// Returns an error if any toolkit declares a duplicate capability/resource or an
/// inconsistent schema.
pub fn build_all(
    audit_capacity: usize,
    audit_window: Duration,
) -> Result<Vec<MountedToolkit>, RegistryError> {
    let audit_log = || Arc::new(AuditLog::new(audit_capacity, audit_window));
    let mounted = |slug, toolkit, speaks_mcp| MountedToolkit {
        slug,
        toolkit: Arc::new(toolkit),
        speaks_mcp,
    };
    Ok(vec![
        mounted("mcp", cultural_compliance::toolkit()?, true),
        mounted("cultural-competence", cultural_competence::toolkit()?, true),
        mounted("data-sovereignty", data_sovereignty::toolkit()?, true),
        mounted(
            "participant-consent",
            participant_consent::toolkit(audit_log())?,
            true,
        ),
        mounted("ai-safety", ai_safety::toolkit(audit_log())?, false),
        mounted("community-feedback", community_feedback::toolkit(), false),
    ])
}

pub(crate) fn text(s: impl Into<String>) -> anyhow::Result<CallToolResult> {
    Ok(CallToolResult::success(vec![Content::text(s.into())]))
}

/// Read-only accessors over validated arguments.
///
/// Required fields are guaranteed present by the dispatcher; accessors still fall back to
/// neutral values so a handler never panics on a shape it did not expect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Args<'a>(pub &'a JsonObject);

impl<'a> Args<'a> {
    pub(crate) fn str(&self, key: &str) -> &'a str {
        self.opt_str(key).unwrap_or_default()
    }

    pub(crate) fn opt_str(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub(crate) fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub(crate) fn list(&self, key: &str) -> Option<Vec<&'a str>> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// Comma-joined list, or `fallback` when the field is absent.
    pub(crate) fn joined(&self, key: &str, fallback: &str) -> String {
        self.list(key)
            .map_or_else(|| fallback.to_string(), |items| items.join(", "))
    }

    pub(crate) fn object(&self, key: &str) -> Option<&'a JsonObject> {
        self.0.get(key).and_then(Value::as_object)
    }
}

pub(crate) fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

pub(crate) fn included(b: bool) -> &'static str {
    if b { "included" } else { "not included" }
}
