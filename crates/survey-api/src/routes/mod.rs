//! HTTP surface: survey endpoints, one endpoint per toolkit, and a health check.

pub mod cors;
pub mod survey;
pub mod toolkit;

use crate::app::AppState;
use crate::error::ApiError;
use axum::http::StatusCode;
use axum::routing::{MethodRouter, get, post};
use axum::{Extension, Json, Router};
use cors::{POST_ONLY, POST_WITH_PREFLIGHT, with_cors};
use rise_capabilities::toolkits::MountedToolkit;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState, toolkits: &[MountedToolkit]) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/create-session",
            post_only(post(survey::create_session)),
        )
        .route(
            "/api/log-conversation",
            post_only(post(survey::log_conversation)),
        )
        .route(
            "/api/link-conversation",
            with_preflight(post(survey::link_conversation)),
        )
        .route("/api/submit-form", with_preflight(post(survey::submit_form)))
        .route(
            "/api/survey-completed",
            with_preflight(post(survey::survey_completed)),
        );

    for mounted in toolkits {
        let kit = Arc::clone(&mounted.toolkit);
        let endpoint = if mounted.speaks_mcp {
            toolkit::endpoint_with_mcp(kit)
        } else {
            toolkit::endpoint(kit)
        };
        router = router.route(&format!("/api/{}", mounted.slug), post_only(endpoint));
    }

    router
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
}

fn post_only(route: MethodRouter) -> MethodRouter {
    with_cors(route.fallback(method_not_allowed), POST_ONLY)
}

fn with_preflight(route: MethodRouter) -> MethodRouter {
    with_cors(
        route.options(preflight).fallback(method_not_allowed),
        POST_WITH_PREFLIGHT,
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Decode a JSON request body. An empty body reads as `{}`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting request body");
        ApiError::InvalidJson
    })
}
