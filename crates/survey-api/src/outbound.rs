//! Shared outbound HTTP client and error sanitizing.

use std::time::Duration;
use url::Url;

/// Build the single client used for database and webhook calls.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rise-survey-api/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Drop credentials, query and fragment from a URL before it is logged or returned.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
