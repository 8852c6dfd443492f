//! Polite HTTP fetching with bounded retry.
//!
//! [`FetchClient`] wraps any single-attempt [`Fetcher`] with the pacing rules
//! every source adapter relies on:
//!
//! - a browser User-Agent picked from [`USER_AGENTS`] for each call, plus
//!   `Accept` headers matching the expected body;
//! - up to [`RetryPolicy::attempts`] tries, with a fixed
//!   [`RetryPolicy::retry_delay`] between failed tries;
//! - a fixed [`RetryPolicy::request_delay`] after every successful response,
//!   so sequential calls never hammer a source.
//!
//! Failure is reported as `None`. Callers treat it as "no data this round".

use std::time::Duration;

use crate::traits::Fetcher;

/// Browser identities rotated across requests.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const JSON_ACCEPT: &str = "application/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single GET request handed to a [`Fetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FetchRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Body type the caller expects, which selects the identity headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    Json,
}

/// Retry and pacing configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries per call, including the first.
    pub attempts: u32,
    /// Fixed wait between a failed try and the next one.
    pub retry_delay: Duration,
    /// Fixed pause after every successful response.
    pub request_delay: Duration,
}

impl RetryPolicy {
    /// Same attempt budget with no waiting at all.
    pub fn without_delays() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_millis(2000),
            request_delay: Duration::from_millis(1000),
        }
    }
}

/// Retrying, rate-limited fetch client over a single-attempt [`Fetcher`].
#[derive(Clone)]
pub struct FetchClient<F> {
    fetcher: F,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<F: Fetcher> FetchClient<F> {
    pub fn new(fetcher: F, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            policy,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Per-request timeout used by [`get_text`](Self::get_text) and
    /// [`get_json`](Self::get_json).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET a page as text with default headers.
    pub async fn get_text(&self, url: &str) -> Option<String> {
        self.fetch_text(url, &[], self.timeout).await
    }

    /// GET and decode a JSON document with default headers.
    pub async fn get_json(&self, url: &str) -> Option<serde_json::Value> {
        self.fetch_json(url, &[], self.timeout).await
    }

    pub async fn fetch_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Option<String> {
        self.fetch_with_retry(url, BodyKind::Html, headers, timeout).await
    }

    /// Fetch and decode JSON. A 2xx body that is not JSON is not retried.
    pub async fn fetch_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Option<serde_json::Value> {
        let body = self
            .fetch_with_retry(url, BodyKind::Json, headers, timeout)
            .await?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Response body is not valid JSON");
                None
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        kind: BodyKind,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Option<String> {
        let request = FetchRequest {
            url: url.to_string(),
            headers: merge_headers(identity_headers(kind), headers),
            timeout,
        };

        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match self.fetcher.fetch(&request).await {
                Ok(body) => {
                    tracing::debug!(%url, attempt, bytes = body.len(), "Fetched");
                    pause(self.policy.request_delay).await;
                    return Some(body);
                }
                Err(e) => {
                    tracing::warn!(
                        %url,
                        attempt,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Request failed"
                    );
                    if attempt < attempts {
                        pause(self.policy.retry_delay).await;
                    }
                }
            }
        }

        tracing::warn!(%url, attempts, "Giving up after all attempts failed");
        None
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn identity_headers(kind: BodyKind) -> Vec<(String, String)> {
    let mut headers = vec![("User-Agent".to_string(), random_user_agent().to_string())];
    match kind {
        BodyKind::Html => {
            headers.push(("Accept".to_string(), HTML_ACCEPT.to_string()));
            headers.push(("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()));
        }
        BodyKind::Json => {
            headers.push(("Accept".to_string(), JSON_ACCEPT.to_string()));
        }
    }
    headers
}

/// Overlay caller headers on the defaults. A caller header replaces a default
/// only when the names match case-insensitively.
fn merge_headers(
    mut defaults: Vec<(String, String)>,
    extra: &[(&str, &str)],
) -> Vec<(String, String)> {
    for (name, value) in extra {
        match defaults
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => defaults.push((name.to_string(), value.to_string())),
        }
    }
    defaults
}

/// Pick a User-Agent from the pool, indexed by the clock's nanoseconds.
pub fn random_user_agent() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    USER_AGENTS[nanos % USER_AGENTS.len()]
}
