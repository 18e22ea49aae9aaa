//! Survey workflow endpoints.
//!
//! Each event writes one primary record; failure there fails the request. The follow-up
//! session update and the webhook are best effort: their failures are logged and the
//! request still succeeds.

use super::parse_body;
use crate::app::AppState;
use crate::error::ApiError;
use crate::persistence::{
    NewConversationLink, NewConversationLog, NewFormSubmission, NewSession, SessionPatch, Table,
    insert_row,
};
use crate::session_id::{self, now_timestamp};
use crate::webhook::WebhookEvent;
use axum::body::Bytes;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    session_id: String,
    success: bool,
}

pub async fn create_session(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let session_id = session_id::generate();
    insert_row(
        state.store.as_ref(),
        Table::ParticipantSessions,
        &NewSession {
            session_id: &session_id,
            consent_status: "pending",
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(session_id = %session_id, error = %e, "session insert failed");
        ApiError::Store(e)
    })?;

    tracing::info!(session_id = %session_id, "session created");
    Ok(Json(CreateSessionResponse {
        session_id,
        success: true,
    }))
}

/// `log-conversation` keeps the snake_case field names its client sends.
#[derive(Debug, Deserialize)]
pub struct LogConversationRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    conversation_data: Option<Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogConversationResponse {
    success: bool,
    data: Vec<Value>,
}

pub async fn log_conversation(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LogConversationResponse>, ApiError> {
    let req: LogConversationRequest = parse_body(&body)?;
    let timestamp = timestamp_or_now(req.timestamp);

    let rows = insert_row(
        state.store.as_ref(),
        Table::AiConversations,
        &NewConversationLog {
            session_id: req.session_id.as_deref(),
            conversation_data: req.conversation_data.as_ref(),
            interaction_timestamp: &timestamp,
            tikanga_compliance_check: false,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(session_id = ?req.session_id, error = %e, "conversation log insert failed");
        ApiError::Store(e)
    })?;

    Ok(Json(LogConversationResponse {
        success: true,
        data: rows,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConversationRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConversationResponse {
    success: bool,
    linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
    data: Option<Value>,
}

pub async fn link_conversation(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LinkConversationResponse>, ApiError> {
    let req: LinkConversationRequest = parse_body(&body)?;
    let timestamp = timestamp_or_now(req.timestamp);
    tracing::info!(
        session_id = ?req.session_id,
        conversation_id = ?req.conversation_id,
        "linking conversation"
    );

    let rows = insert_row(
        state.store.as_ref(),
        Table::ConversationLinks,
        &NewConversationLink {
            session_id: req.session_id.as_deref(),
            conversation_id: req.conversation_id.as_deref(),
            linked_at: &timestamp,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(
            session_id = ?req.session_id,
            error = %e,
            "conversation link insert failed"
        );
        ApiError::Database(e)
    })?;

    update_session_best_effort(
        &state,
        req.session_id.as_deref(),
        &SessionPatch {
            conversation_started: Some(true),
            conversation_id: req.conversation_id.clone(),
            conversation_started_at: Some(timestamp.clone()),
            ..SessionPatch::default()
        },
    )
    .await;

    state.events.forward(WebhookEvent::ConversationLink {
        session_id: req.session_id.clone(),
        conversation_id: req.conversation_id.clone(),
        timestamp,
    });

    Ok(Json(LinkConversationResponse {
        success: true,
        linked: true,
        session_id: req.session_id,
        conversation_id: req.conversation_id,
        data: rows.into_iter().next(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    form_data: Option<Value>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    message: &'static str,
    timestamp: String,
}

pub async fn submit_form(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitFormResponse>, ApiError> {
    let req: SubmitFormRequest = parse_body(&body)?;
    tracing::info!(
        session_id = ?req.session_id,
        source = ?req.source,
        timestamp = ?req.timestamp,
        has_form_data = req.form_data.is_some(),
        "form submission received"
    );
    let timestamp = timestamp_or_now(req.timestamp);

    insert_row(
        state.store.as_ref(),
        Table::FormSubmissions,
        &NewFormSubmission {
            session_id: req.session_id.as_deref(),
            form_data: req.form_data.as_ref(),
            submission_source: req.source.as_deref(),
            submitted_at: &timestamp,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(session_id = ?req.session_id, error = %e, "form submission insert failed");
        ApiError::Database(e)
    })?;

    update_session_best_effort(
        &state,
        req.session_id.as_deref(),
        &SessionPatch {
            form_completed: Some(true),
            form_completed_at: Some(timestamp.clone()),
            ..SessionPatch::default()
        },
    )
    .await;

    state.events.forward(WebhookEvent::FormSubmission {
        session_id: req.session_id.clone(),
        form_data: req.form_data,
        source: req.source,
        timestamp,
    });

    Ok(Json(SubmitFormResponse {
        success: true,
        session_id: req.session_id,
        message: "Form submitted successfully",
        timestamp: now_timestamp(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCompletedRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    completion_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCompletedResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_type: Option<String>,
}

pub async fn survey_completed(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SurveyCompletedResponse>, ApiError> {
    let req: SurveyCompletedRequest = parse_body(&body)?;
    tracing::info!(
        session_id = ?req.session_id,
        completion_type = ?req.completion_type,
        "survey completed"
    );

    state.events.forward(WebhookEvent::SurveyCompleted {
        session_id: req.session_id.clone(),
        completion_type: req.completion_type.clone(),
        timestamp: timestamp_or_now(req.timestamp),
    });

    Ok(Json(SurveyCompletedResponse {
        success: true,
        session_id: req.session_id,
        completion_type: req.completion_type,
    }))
}

fn timestamp_or_now(client: Option<String>) -> String {
    client
        .filter(|t| !t.is_empty())
        .unwrap_or_else(now_timestamp)
}

/// Mark the session as progressed. Failures never fail the request.
async fn update_session_best_effort(
    state: &AppState,
    session_id: Option<&str>,
    patch: &SessionPatch,
) {
    let Some(session_id) = session_id else {
        tracing::warn!("no sessionId in request; session status not updated");
        return;
    };
    if let Err(e) = state.store.update_session(session_id, patch).await {
        tracing::warn!(
            session_id = %session_id,
            error = %e,
            "could not update session status"
        );
    }
}
