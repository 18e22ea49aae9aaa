use crate::dispatch::Toolkit;

/// The community feedback endpoint. No capabilities are registered yet, so discovery
/// returns empty lists and every `callTool` is an unknown operation.
#[must_use]
pub fn toolkit() -> Toolkit {
    Toolkit::new("community-feedback", "1.0.0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DiscoveryKind;
    use serde_json::json;

    #[tokio::test]
    async fn discovery_is_empty() {
        let kit = toolkit();
        let tools = kit
            .discover(DiscoveryKind::ListTools, None)
            .await
            .expect("listTools");
        assert_eq!(tools, json!({ "tools": [] }));
        let resources = kit
            .discover(DiscoveryKind::ListResources, None)
            .await
            .expect("listResources");
        assert_eq!(resources, json!({ "resources": [] }));
    }

    #[tokio::test]
    async fn any_call_is_unknown() {
        let err = toolkit().call("submit_feedback", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: submit_feedback");
    }
}
