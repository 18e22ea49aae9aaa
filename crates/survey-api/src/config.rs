use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// Log line encoding.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rise-survey-api",
    version,
    about = "RISE survey API: session/consent persistence and toolkit endpoints"
)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "RISE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Base URL of the hosted database (PostgREST API lives under `/rest/v1`).
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Url,

    /// Access key sent as `apikey` and bearer token.
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: String,

    /// Outbound webhook. Forwarding is disabled when unset or blank.
    #[arg(long, env = "N8N_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Timeout for every outbound request (database and webhook).
    #[arg(long, env = "RISE_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Maximum number of audit entries kept in memory.
    #[arg(
        long,
        env = "RISE_AUDIT_CAPACITY",
        default_value_t = rise_capabilities::audit::DEFAULT_CAPACITY
    )]
    pub audit_capacity: usize,

    /// Audit entries older than this are dropped.
    #[arg(long, env = "RISE_AUDIT_WINDOW_SECS", default_value_t = 86_400)]
    pub audit_window_secs: u64,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "RISE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "RISE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// The configured webhook, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when a non-blank value is not a valid absolute URL.
    pub fn webhook_url(&self) -> anyhow::Result<Option<Url>> {
        match self.webhook_url.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Url::parse(raw)
                .map(Some)
                .with_context(|| format!("invalid webhook URL '{raw}'")),
        }
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn audit_window(&self) -> Duration {
        Duration::from_secs(self.audit_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec![
            "rise-survey-api",
            "--supabase-url",
            "https://db.example.test",
            "--supabase-key",
            "anon",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("valid args")
    }

    #[test]
    fn defaults_apply() {
        let cli = parse(&[]);
        assert_eq!(cli.bind, "127.0.0.1:3000".parse::<SocketAddr>().expect("addr"));
        assert_eq!(cli.http_timeout(), Duration::from_secs(10));
        assert_eq!(cli.audit_capacity, 1_000);
        assert_eq!(cli.audit_window(), Duration::from_secs(86_400));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn blank_webhook_counts_as_unset() {
        let cli = parse(&["--webhook-url", "  "]);
        assert!(cli.webhook_url().expect("blank is fine").is_none());
    }

    #[test]
    fn malformed_webhook_is_an_error() {
        let cli = parse(&["--webhook-url", "not a url"]);
        assert!(cli.webhook_url().is_err());
    }

    #[test]
    fn json_log_format_parses() {
        let cli = parse(&["--log-format", "json", "--webhook-url", "http://127.0.0.1:9/hook"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(
            cli.webhook_url().expect("valid").map(|u| u.to_string()),
            Some("http://127.0.0.1:9/hook".to_string())
        );
    }
}
