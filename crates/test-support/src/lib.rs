use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// Serve `router` on an ephemeral localhost port in the background.
async fn serve_in_background(router: Router) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake server")?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, task))
}

/// One write received by [`FakePostgrest`].
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub table: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedWrite {
    /// Header value by lowercase name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FakeStoreState {
    inserts: Mutex<Vec<RecordedWrite>>,
    updates: Mutex<Vec<RecordedWrite>>,
    insert_failures: Mutex<HashMap<String, (u16, String)>>,
    update_failure: Mutex<Option<(u16, String)>>,
    next_id: AtomicU64,
}

/// Minimal PostgREST stand-in: `POST /rest/v1/{table}` echoes the inserted rows with an
/// `id`, `PATCH /rest/v1/{table}` answers 204. Every request is recorded.
pub struct FakePostgrest {
    addr: SocketAddr,
    state: Arc<FakeStoreState>,
    task: JoinHandle<()>,
}

impl FakePostgrest {
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(FakeStoreState::default());
        let router = Router::new()
            .route("/rest/v1/{table}", post(fake_insert).patch(fake_update))
            .with_state(Arc::clone(&state));
        let (addr, task) = serve_in_background(router).await?;
        Ok(Self { addr, state, task })
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make inserts into `table` fail with a PostgREST-style error body.
    pub fn fail_inserts(&self, table: &str, status: u16, message: &str) {
        self.state
            .insert_failures
            .lock()
            .insert(table.to_string(), (status, message.to_string()));
    }

    /// Make every session update fail.
    pub fn fail_updates(&self, status: u16, message: &str) {
        *self.state.update_failure.lock() = Some((status, message.to_string()));
    }

    #[must_use]
    pub fn inserts(&self, table: &str) -> Vec<RecordedWrite> {
        self.state
            .inserts
            .lock()
            .iter()
            .filter(|w| w.table == table)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn updates(&self) -> Vec<RecordedWrite> {
        self.state.updates.lock().clone()
    }
}

impl Drop for FakePostgrest {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn record(
    table: String,
    query: Option<String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> RecordedWrite {
    RecordedWrite {
        table,
        query,
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    }
}

fn postgrest_error(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
    (status, axum::Json(json!({ "code": "PGRST000", "message": message }))).into_response()
}

async fn fake_insert(
    State(state): State<Arc<FakeStoreState>>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let write = record(table.clone(), query, &headers, &body);
    let rows = match write.body.clone() {
        Value::Array(items) => items,
        other => vec![other],
    };
    state.inserts.lock().push(write);

    if let Some((status, message)) = state.insert_failures.lock().get(&table).cloned() {
        return postgrest_error(status, &message);
    }

    let rows: Vec<Value> = rows
        .into_iter()
        .map(|mut row| {
            if let Value::Object(map) = &mut row {
                let id = state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                map.insert("id".to_string(), json!(id));
            }
            row
        })
        .collect();
    (StatusCode::CREATED, axum::Json(Value::Array(rows))).into_response()
}

async fn fake_update(
    State(state): State<Arc<FakeStoreState>>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state
        .updates
        .lock()
        .push(record(table, query, &headers, &body));
    if let Some((status, message)) = state.update_failure.lock().clone() {
        return postgrest_error(status, &message);
    }
    StatusCode::NO_CONTENT.into_response()
}

struct RecorderState {
    events: Mutex<Vec<Value>>,
    status: AtomicU16,
}

/// Webhook endpoint that records every JSON body posted to `/hook`.
pub struct WebhookRecorder {
    addr: SocketAddr,
    state: Arc<RecorderState>,
    task: JoinHandle<()>,
}

impl WebhookRecorder {
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(RecorderState {
            events: Mutex::new(Vec::new()),
            status: AtomicU16::new(200),
        });
        let router = Router::new()
            .route("/hook", post(record_event))
            .with_state(Arc::clone(&state));
        let (addr, task) = serve_in_background(router).await?;
        Ok(Self { addr, state, task })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    /// Status returned to the sender from now on. Bodies are still recorded.
    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::Relaxed);
    }

    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.state.events.lock().clone()
    }

    /// Wait until at least `n` events have arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `n` events arrive before the timeout.
    pub async fn wait_for(&self, n: usize, timeout_dur: Duration) -> anyhow::Result<Vec<Value>> {
        let start = Instant::now();
        loop {
            let events = self.events();
            if events.len() >= n {
                return Ok(events);
            }
            if start.elapsed() > timeout_dur {
                anyhow::bail!("expected {n} webhook events, got {}", events.len());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for WebhookRecorder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record_event(State(state): State<Arc<RecorderState>>, body: Bytes) -> StatusCode {
    state
        .events
        .lock()
        .push(serde_json::from_slice(&body).unwrap_or(Value::Null));
    StatusCode::from_u16(state.status.load(Ordering::Relaxed)).unwrap_or(StatusCode::OK)
}
