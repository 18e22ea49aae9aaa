#![allow(dead_code)]

use anyhow::Context as _;
use std::process::{Child, Command};
use std::time::Duration;

pub use rise_test_support::{FakePostgrest, KillOnDrop, WebhookRecorder};

pub fn pick_unused_port() -> anyhow::Result<u16> {
    rise_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    rise_test_support::wait_http_ok(url, timeout_dur).await
}

pub fn spawn_api(store_url: &str, webhook_url: Option<&str>, port: u16) -> anyhow::Result<Child> {
    let bin = env!("CARGO_BIN_EXE_rise-survey-api");
    let mut cmd = Command::new(bin);
    cmd.env_remove("N8N_WEBHOOK_URL")
        .env_remove("RUST_LOG")
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--supabase-url")
        .arg(store_url)
        .arg("--supabase-key")
        .arg("test-anon-key")
        .arg("--http-timeout-secs")
        .arg("5")
        .arg("--log-level")
        .arg("info");
    if let Some(url) = webhook_url {
        cmd.arg("--webhook-url").arg(url);
    }
    cmd.spawn().context("spawn rise-survey-api")
}

/// A running API process plus the fakes it talks to.
pub struct Running {
    pub base: String,
    pub store: FakePostgrest,
    pub webhook: Option<WebhookRecorder>,
    pub client: reqwest::Client,
    _child: KillOnDrop,
}

impl Running {
    pub async fn start(with_webhook: bool) -> anyhow::Result<Self> {
        let store = FakePostgrest::start().await?;
        let webhook = if with_webhook {
            Some(WebhookRecorder::start().await?)
        } else {
            None
        };
        let port = pick_unused_port()?;
        let child = spawn_api(
            &store.base_url(),
            webhook.as_ref().map(WebhookRecorder::url).as_deref(),
            port,
        )?;
        let child = KillOnDrop(child);
        let base = format!("http://127.0.0.1:{port}");
        wait_http_ok(&format!("{base}/health"), Duration::from_secs(20)).await?;
        Ok(Self {
            base,
            store,
            webhook,
            client: reqwest::Client::new(),
            _child: child,
        })
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<(reqwest::StatusCode, serde_json::Value)> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        let status = resp.status();
        let json = resp.json().await.with_context(|| format!("decode {path}"))?;
        Ok((status, json))
    }

    /// POST one MCP JSON-RPC message and return the message carried by the SSE reply.
    pub async fn post_mcp(
        &self,
        path: &str,
        message: &serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .header("accept", "application/json, text/event-stream")
            .json(message)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        anyhow::ensure!(resp.status().is_success(), "{path} status {}", resp.status());
        let text = resp.text().await?;
        let data = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .find(|data| !data.is_empty())
            .with_context(|| format!("no SSE data in {text:?}"))?;
        serde_json::from_str(data).context("decode JSON-RPC reply")
    }
}
