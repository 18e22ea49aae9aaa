//! Best-effort event forwarding to the workflow webhook.
//!
//! Delivery is at most once: each event is posted from a detached task, failures are
//! logged at `warn` and dropped, and the originating request never waits for it.

use crate::outbound::{redact_url, sanitize_reqwest_error};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum WebhookEvent {
    FormSubmission {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        form_data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        timestamp: String,
    },
    ConversationLink {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        timestamp: String,
    },
    SurveyCompleted {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        completion_type: Option<String>,
        timestamp: String,
    },
}

impl WebhookEvent {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FormSubmission { .. } => "form_submission",
            Self::ConversationLink { .. } => "conversation_link",
            Self::SurveyCompleted { .. } => "survey_completed",
        }
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    Transport(String),
    #[error("webhook returned HTTP {0}")]
    Status(u16),
}

/// Destination for domain events.
pub trait EventSink: Send + Sync {
    /// Hand off an event. Must not block and must not fail the caller.
    fn forward(&self, event: WebhookEvent);
}

/// Used when no webhook is configured: events are dropped without any network call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

impl EventSink for DisabledSink {
    fn forward(&self, event: WebhookEvent) {
        tracing::debug!(event = event.kind(), "webhook not configured; event dropped");
    }
}

#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: reqwest::Client,
    url: Url,
}

impl HttpWebhook {
    #[must_use]
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Post one event and wait for the response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn deliver(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let resp = self
            .client
            .post(self.url.clone())
            .json(event)
            .send()
            .await
            .map_err(|e| WebhookError::Transport(sanitize_reqwest_error(&e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status.as_u16()));
        }
        Ok(())
    }
}

impl EventSink for HttpWebhook {
    fn forward(&self, event: WebhookEvent) {
        let hook = self.clone();
        tokio::spawn(async move {
            match hook.deliver(&event).await {
                Ok(()) => tracing::debug!(event = event.kind(), "webhook delivered"),
                Err(e) => tracing::warn!(
                    event = event.kind(),
                    url = %redact_url(&hook.url),
                    error = %e,
                    "webhook forwarding failed"
                ),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rise_test_support::WebhookRecorder;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn events_serialize_with_type_tag_and_camel_case_fields() {
        let event = WebhookEvent::FormSubmission {
            session_id: Some("RISE_1_abc".to_string()),
            form_data: Some(json!({ "q1": "yes" })),
            source: Some("web".to_string()),
            timestamp: "2026-10-16T09:30:00.000Z".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({
                "type": "form_submission",
                "sessionId": "RISE_1_abc",
                "formData": { "q1": "yes" },
                "source": "web",
                "timestamp": "2026-10-16T09:30:00.000Z"
            })
        );
    }

    #[test]
    fn absent_fields_are_omitted() {
        let event = WebhookEvent::SurveyCompleted {
            session_id: None,
            completion_type: Some("full".to_string()),
            timestamp: "t".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({ "type": "survey_completed", "completionType": "full", "timestamp": "t" })
        );
    }

    #[tokio::test]
    async fn forward_posts_in_the_background() {
        let recorder = WebhookRecorder::start().await.expect("recorder");
        let hook = HttpWebhook::new(
            reqwest::Client::new(),
            Url::parse(&recorder.url()).expect("url"),
        );
        hook.forward(WebhookEvent::ConversationLink {
            session_id: Some("RISE_1_abc".to_string()),
            conversation_id: Some("conv-1".to_string()),
            timestamp: "t".to_string(),
        });

        let events = recorder
            .wait_for(1, Duration::from_secs(5))
            .await
            .expect("event arrives");
        assert_eq!(events[0]["type"], json!("conversation_link"));
        assert_eq!(events[0]["conversationId"], json!("conv-1"));
    }

    #[tokio::test]
    async fn deliver_reports_non_success_status() {
        let recorder = WebhookRecorder::start().await.expect("recorder");
        recorder.respond_with(502);
        let hook = HttpWebhook::new(
            reqwest::Client::new(),
            Url::parse(&recorder.url()).expect("url"),
        );
        let err = hook
            .deliver(&WebhookEvent::SurveyCompleted {
                session_id: None,
                completion_type: None,
                timestamp: "t".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Status(502)));
    }
}
