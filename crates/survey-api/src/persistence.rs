//! Writes to the hosted database.
//!
//! The store is reached through its PostgREST dialect: inserts are `POST /rest/v1/<table>`
//! returning the inserted rows, and session updates are `PATCH` with an `eq.` filter on
//! `session_id`. Handlers depend on [`SessionStore`] only, so tests can swap in an
//! in-memory store.

use crate::outbound::sanitize_reqwest_error;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("invalid response from store: {0}")]
    Decode(String),

    /// A row could not be encoded.
    #[error("invalid row: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    ParticipantSessions,
    FormSubmissions,
    ConversationLinks,
    AiConversations,
}

impl Table {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParticipantSessions => "participant_sessions",
            Self::FormSubmissions => "form_submissions",
            Self::ConversationLinks => "conversation_links",
            Self::AiConversations => "ai_conversations",
        }
    }
}

/// Fields set on `participant_sessions` after a later event. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_started: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_started_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewSession<'a> {
    pub session_id: &'a str,
    pub consent_status: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewFormSubmission<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_source: Option<&'a str>,
    pub submitted_at: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewConversationLink<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
    pub linked_at: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewConversationLog<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_data: Option<&'a Value>,
    pub interaction_timestamp: &'a str,
    pub tikanga_compliance_check: bool,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert one row and return the rows the store reports as inserted.
    async fn insert(&self, table: Table, row: Value) -> Result<Vec<Value>, StoreError>;

    /// Apply `patch` to the session identified by `session_id`.
    async fn update_session(&self, session_id: &str, patch: &SessionPatch)
    -> Result<(), StoreError>;
}

/// Encode a typed row and insert it.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] if the row does not serialize, otherwise whatever the
/// store returns.
pub async fn insert_row<T: Serialize + Sync>(
    store: &dyn SessionStore,
    table: Table,
    row: &T,
) -> Result<Vec<Value>, StoreError> {
    let row = serde_json::to_value(row).map_err(|e| StoreError::Encode(e.to_string()))?;
    store.insert(table, row).await
}

/// [`SessionStore`] over the PostgREST HTTP API.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base: Url,
    key: String,
}

impl PostgrestStore {
    #[must_use]
    pub fn new(client: reqwest::Client, base: Url, key: impl Into<String>) -> Self {
        Self {
            client,
            base,
            key: key.into(),
        }
    }

    fn table_url(&self, table: Table) -> Result<Url, StoreError> {
        let raw = format!(
            "{}/rest/v1/{}",
            self.base.as_str().trim_end_matches('/'),
            table.as_str()
        );
        Url::parse(&raw).map_err(|e| StoreError::Encode(format!("bad table URL: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url, prefer: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", prefer)
    }
}

#[async_trait]
impl SessionStore for PostgrestStore {
    async fn insert(&self, table: Table, row: Value) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table)?;
        let resp = self
            .request(reqwest::Method::POST, url, "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Transport(sanitize_reqwest_error(&e)))?;
        let resp = check_status(resp).await?;
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Decode(sanitize_reqwest_error(&e)))?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!(
                "expected an array of rows, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: &SessionPatch,
    ) -> Result<(), StoreError> {
        let mut url = self.table_url(Table::ParticipantSessions)?;
        url.query_pairs_mut()
            .append_pair("session_id", &format!("eq.{session_id}"));
        let resp = self
            .request(reqwest::Method::PATCH, url, "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| StoreError::Transport(sanitize_reqwest_error(&e)))?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("store returned HTTP {status}"));
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
