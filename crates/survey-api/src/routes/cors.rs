use axum::http::HeaderValue;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::routing::MethodRouter;
use std::convert::Infallible;
use tower_http::set_header::SetResponseHeaderLayer;

/// Methods advertised by endpoints that only take POST.
pub const POST_ONLY: &str = "POST";
/// Methods advertised by endpoints that also answer pre-flight requests.
pub const POST_WITH_PREFLIGHT: &str = "POST, OPTIONS";

/// Attach the permissive CORS headers to every response of `route`, including 405s.
pub fn with_cors(route: MethodRouter, methods: &'static str) -> MethodRouter {
    route
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(methods),
        ))
        .layer::<_, Infallible>(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}
