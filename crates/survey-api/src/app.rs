use crate::config::Cli;
use crate::outbound::{self, redact_url};
use crate::persistence::{PostgrestStore, SessionStore};
use crate::routes;
use crate::webhook::{DisabledSink, EventSink, HttpWebhook};
use anyhow::Context as _;
use axum::Router;
use rise_capabilities::toolkits;
use std::sync::Arc;

/// Collaborators shared by the survey handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub events: Arc<dyn EventSink>,
}

/// Wire the store, the webhook forwarder and every toolkit into a router.
///
/// # Errors
///
/// Returns an error for an invalid webhook URL, a client that cannot be built, or a
/// toolkit that fails to assemble.
pub fn build(cli: &Cli) -> anyhow::Result<Router> {
    let client = outbound::build_client(cli.http_timeout()).context("build HTTP client")?;

    let store = PostgrestStore::new(
        client.clone(),
        cli.supabase_url.clone(),
        cli.supabase_key.clone(),
    );

    let events: Arc<dyn EventSink> = match cli.webhook_url()? {
        Some(url) => {
            tracing::info!(url = %redact_url(&url), "webhook forwarding enabled");
            Arc::new(HttpWebhook::new(client, url))
        }
        None => {
            tracing::info!("webhook forwarding disabled");
            Arc::new(DisabledSink)
        }
    };

    let mounted = toolkits::build_all(cli.audit_capacity, cli.audit_window())
        .context("assemble toolkits")?;
    for m in &mounted {
        tracing::debug!(
            slug = m.slug,
            toolkit = %m.toolkit.info.name,
            tools = m.toolkit.registry.len(),
            resources = m.toolkit.resources.len(),
            mcp = m.speaks_mcp,
            "toolkit mounted"
        );
    }

    let state = AppState {
        store: Arc::new(store),
        events,
    };
    Ok(routes::router(state, &mounted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingSink};
    use crate::webhook::WebhookEvent;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use rise_capabilities::audit::{DEFAULT_CAPACITY, DEFAULT_WINDOW};
    use http_body_util::BodyExt as _;
    use serde_json::{Value, json};
    use tower::ServiceExt as _;

    struct Harness {
        router: Router,
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::default());
        let sink = Arc::new(RecordingSink::default());
        let mounted =
            toolkits::build_all(DEFAULT_CAPACITY, DEFAULT_WINDOW).expect("toolkits build");
        let state = AppState {
            store: store.clone(),
            events: sink.clone(),
        };
        Harness {
            router: routes::router(state, &mounted),
            store,
            sink,
        }
    }

    async fn send_raw(
        router: &Router,
        request: Request<Body>,
    ) -> (StatusCode, HeaderMap, axum::body::Bytes) {
        let resp = router
            .clone()
            .oneshot(request)
            .await
            .expect("router never errors");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, headers, bytes)
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let (status, headers, bytes) = send_raw(router, request).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, headers, json)
    }

    /// POST one JSON-RPC message and return the single message carried by the SSE reply.
    async fn send_mcp(
        router: &Router,
        uri: &str,
        message: Value,
    ) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .body(Body::from(message.to_string()))
            .expect("request");
        let (status, headers, bytes) = send_raw(router, request).await;
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
        let reply = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .find(|data| !data.is_empty())
            .map(|data| serde_json::from_str(data).expect("json-rpc message"))
            .unwrap_or(Value::Null);
        (status, headers, reply)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let h = harness();
        let (status, _, body) = send(&h.router, "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn create_session_inserts_pending_session() {
        let h = harness();
        let (status, headers, body) = send(&h.router, "POST", "/api/create-session", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let session_id = body["sessionId"].as_str().expect("sessionId");
        assert!(crate::session_id::is_well_formed(session_id));
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST");

        let rows = h.store.rows(crate::persistence::Table::ParticipantSessions);
        assert_eq!(
            rows,
            vec![json!({ "session_id": session_id, "consent_status": "pending" })]
        );
    }

    #[tokio::test]
    async fn create_session_failure_returns_store_message() {
        let h = harness();
        h.store.fail_inserts("relation does not exist");
        let (status, _, body) = send(&h.router, "POST", "/api/create-session", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "relation does not exist" }));
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_cors_headers() {
        let h = harness();
        let (status, headers, body) = send(&h.router, "GET", "/api/submit-form", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    }

    #[tokio::test]
    async fn preflight_is_empty_200() {
        let h = harness();
        let (status, headers, body) =
            send(&h.router, "OPTIONS", "/api/link-conversation", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");

        let (status, _, _) = send(&h.router, "OPTIONS", "/api/create-session", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn submit_form_writes_updates_and_forwards() {
        let h = harness();
        let req = json!({
            "sessionId": "RISE_1_abcdefgh",
            "formData": { "q1": "yes" },
            "source": "web",
            "timestamp": "2026-10-16T09:30:00.000Z"
        });
        let (status, _, body) =
            send(&h.router, "POST", "/api/submit-form", &req.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["sessionId"], json!("RISE_1_abcdefgh"));
        assert_eq!(body["message"], json!("Form submitted successfully"));
        assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));

        let rows = h.store.rows(crate::persistence::Table::FormSubmissions);
        assert_eq!(
            rows,
            vec![json!({
                "session_id": "RISE_1_abcdefgh",
                "form_data": { "q1": "yes" },
                "submission_source": "web",
                "submitted_at": "2026-10-16T09:30:00.000Z"
            })]
        );

        let updates = h.store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "RISE_1_abcdefgh");
        assert_eq!(updates[0].1.form_completed, Some(true));
        assert_eq!(
            updates[0].1.form_completed_at.as_deref(),
            Some("2026-10-16T09:30:00.000Z")
        );

        assert_eq!(
            h.sink.events(),
            vec![WebhookEvent::FormSubmission {
                session_id: Some("RISE_1_abcdefgh".to_string()),
                form_data: Some(json!({ "q1": "yes" })),
                source: Some("web".to_string()),
                timestamp: "2026-10-16T09:30:00.000Z".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn submit_form_primary_failure_is_database_error_and_skips_side_effects() {
        let h = harness();
        h.store.fail_inserts("permission denied");
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/submit-form",
            r#"{"sessionId":"RISE_1_abcdefgh"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "Database error", "details": "permission denied" })
        );
        assert!(h.store.updates().is_empty());
        assert!(h.sink.events().is_empty());
    }

    #[tokio::test]
    async fn link_conversation_survives_secondary_update_failure() {
        let h = harness();
        h.store.fail_updates("row not found");
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/link-conversation",
            r#"{"sessionId":"RISE_1_abcdefgh","conversationId":"conv-9"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["linked"], json!(true));
        assert_eq!(body["conversationId"], json!("conv-9"));
        assert_eq!(body["data"]["conversation_id"], json!("conv-9"));
        assert_eq!(h.sink.events().len(), 1);
    }

    #[tokio::test]
    async fn log_conversation_returns_inserted_rows() {
        let h = harness();
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/log-conversation",
            r#"{"session_id":"RISE_1_abcdefgh","conversation_data":{"turns":3}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let row = &body["data"][0];
        assert_eq!(row["session_id"], json!("RISE_1_abcdefgh"));
        assert_eq!(row["tikanga_compliance_check"], json!(false));
        assert!(row["interaction_timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn survey_completed_only_forwards() {
        let h = harness();
        let body = r#"{"sessionId":"RISE_1_abcdefgh","completionType":"full","timestamp":"t0"}"#;
        for _ in 0..2 {
            let (status, _, resp) = send(&h.router, "POST", "/api/survey-completed", body).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                resp,
                json!({ "success": true, "sessionId": "RISE_1_abcdefgh", "completionType": "full" })
            );
        }
        let events = h.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], events[1]);
        assert!(h.store.updates().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let h = harness();
        let (status, _, body) = send(&h.router, "POST", "/api/submit-form", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid JSON body" }));
    }

    #[tokio::test]
    async fn toolkit_invalid_params_are_400_and_unknown_tools_500() {
        let h = harness();
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/data-sovereignty",
            r#"{"operation":"assess_cultural_impact","arguments":{"proposed_action":"x"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!(-32602));
        assert!(body.get("stack").is_none());

        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/data-sovereignty",
            r#"{"operation":"nope"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Unknown tool: nope", "code": -32601 }));
    }

    #[tokio::test]
    async fn toolkit_discovery_lists_tools() {
        let h = harness();
        let (status, _, body) =
            send(&h.router, "POST", "/api/mcp", r#"{"type":"listTools"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["tools"]
            .as_array()
            .expect("tools")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "validate_tikanga_compliance");

        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/community-feedback",
            r#"{"type":"listTools"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "tools": [] }));
    }

    #[tokio::test]
    async fn toolkit_unknown_type_is_400() {
        let h = harness();
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/ai-safety",
            r#"{"type":"dropTables"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Unknown API type" }));
    }

    #[tokio::test]
    async fn json_rpc_messages_reach_the_mcp_surface() {
        let h = harness();
        let (status, headers, reply) = send_mcp(
            &h.router,
            "/api/mcp",
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(reply["id"], json!(1));
        let tools = reply["result"]["tools"].as_array().expect("tools");
        assert_eq!(tools.len(), 6);
        assert_eq!(tools[0]["name"], json!("validate_tikanga_compliance"));

        let (_, _, reply) = send_mcp(
            &h.router,
            "/api/participant-consent",
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "resources/read",
                "params": { "uri": "consent://tracking" }
            }),
        )
        .await;
        assert_eq!(reply["result"]["contents"][0]["uri"], json!("consent://tracking"));
    }

    #[tokio::test]
    async fn mcp_tool_errors_keep_their_codes() {
        let h = harness();
        let (_, _, reply) = send_mcp(
            &h.router,
            "/api/cultural-competence",
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": { "name": "validate_cultural_action", "arguments": {} }
            }),
        )
        .await;
        assert_eq!(reply["error"]["code"], json!(-32602));
        assert_eq!(
            reply["error"]["data"]["violations"][0]["parameter"],
            json!("action")
        );
    }

    #[tokio::test]
    async fn json_rpc_on_a_toolkit_without_mcp_is_unknown_api_type() {
        let h = harness();
        let (status, _, body) = send(
            &h.router,
            "POST",
            "/api/ai-safety",
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Unknown API type" }));
    }
}
