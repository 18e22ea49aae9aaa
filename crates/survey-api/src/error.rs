use crate::persistence::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rise_capabilities::DispatchError;
use serde_json::json;
use thiserror::Error;

/// Every failure an endpoint can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON body")]
    InvalidJson,

    #[error("Unknown API type")]
    UnknownApiType,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Primary write failed; answered as `{error: <store message>}`.
    #[error("{0}")]
    Store(StoreError),

    /// Primary write failed; answered as `{error: "Database error", details}`.
    #[error("Database error")]
    Database(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": self.to_string() })))
                    .into_response()
            }
            Self::InvalidJson | Self::UnknownApiType => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() })))
                    .into_response()
            }
            Self::Dispatch(e) => {
                let status = match e {
                    DispatchError::InvalidParams { .. } => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let mut body = json!({ "error": e.to_string(), "code": e.code() });
                if let Some(data) = e.data() {
                    body["data"] = data.clone();
                }
                (status, Json(body)).into_response()
            }
            Self::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response(),
            Self::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Database error", "details": e.to_string() })),
            )
                .into_response(),
        }
    }
}
