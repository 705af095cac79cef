//! Shared infrastructure for the harvesters.
//!
//! Both harvesters reuse:
//! - `FetchClient` - blocking HTTP client with retry / Retry-After / error
//!   classification
//! - `FetchSession` - per-harvest counters, passed explicitly and handed
//!   back with the payload
//!
//! # Retry contract
//!
//! - **503**: wait `Retry-After` seconds and try again. A 503 without a
//!   usable header is fatal. Waits do not consume the recovery budget but
//!   are capped per request (`max_throttle_waits`).
//! - **Network errors, 429, other 5xx**: sleep a fixed `backoff` and try
//!   again, at most `max_retries` times across the whole session.
//! - **Other 4xx**: fatal immediately.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::config::HarvestConfig;
use crate::exit_codes::EXIT_FETCH_UPSTREAM;
use crate::CliError;

pub(crate) const USER_AGENT: &str = concat!("scholarlink/", env!("CARGO_PKG_VERSION"));

// ── Session counters ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSession {
    /// Response body bytes received.
    pub raw_bytes: u64,
    /// HTTP requests sent, retries included.
    pub requests: u32,
    /// Recoveries spent from the retry budget.
    pub recoveries: u32,
    /// Pages (OAI) or documents (graph) successfully parsed.
    pub pages: u32,
    pub records: usize,
}

// ── Retry policy ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub max_throttle_waits: u32,
}

impl From<&HarvestConfig> for RetryPolicy {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_secs(config.backoff_secs),
            max_throttle_waits: config.max_throttle_waits,
        }
    }
}

// ── FetchClient ────────────────────────────────────────────────────

pub struct FetchClient {
    http: Client,
    source_name: String,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(source_name: &str, config: &HarvestConfig) -> Result<Self, CliError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: EXIT_FETCH_UPSTREAM,
                message: format!("failed to build HTTP client: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            policy: RetryPolicy::from(config),
        })
    }

    /// GET with the retry contract above; returns the body as text.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured request (URL, query, headers).
    pub fn get_text(
        &self,
        session: &mut FetchSession,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<String, CliError> {
        let mut throttle_waits = 0u32;

        loop {
            session.requests += 1;
            let failure = match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 503 {
                        let wait = retry_after(&resp).ok_or_else(|| {
                            self.upstream_err(format!(
                                "{} unavailable (503) without a usable Retry-After header",
                                self.source_name
                            ))
                        })?;
                        if throttle_waits == self.policy.max_throttle_waits {
                            return Err(self.upstream_err(format!(
                                "{} still unavailable after {} Retry-After waits",
                                self.source_name, throttle_waits
                            )));
                        }
                        throttle_waits += 1;
                        warn!(
                            source = %self.source_name,
                            wait_secs = wait.as_secs(),
                            "server busy (503); honouring Retry-After"
                        );
                        thread::sleep(wait);
                        continue;
                    }

                    if status == 429 || status >= 500 {
                        format!("HTTP {status}")
                    } else if status >= 400 {
                        return Err(self.upstream_err(format!(
                            "{} error ({}) for {}",
                            self.source_name,
                            status,
                            resp.url()
                        )));
                    } else {
                        match resp.text() {
                            Ok(body) => {
                                session.raw_bytes += body.len() as u64;
                                debug!(
                                    source = %self.source_name,
                                    bytes = body.len(),
                                    "response received"
                                );
                                return Ok(body);
                            }
                            Err(e) => format!("failed to read body: {e}"),
                        }
                    }
                }
                Err(e) => e.to_string(),
            };

            if session.recoveries >= self.policy.max_retries {
                return Err(self.upstream_err(format!(
                    "{} upstream error after {} retries: {}",
                    self.source_name, self.policy.max_retries, failure
                )));
            }
            session.recoveries += 1;
            warn!(
                source = %self.source_name,
                retry = session.recoveries,
                max = self.policy.max_retries,
                wait_secs = self.policy.backoff.as_secs(),
                "transient failure ({failure}); retrying"
            );
            thread::sleep(self.policy.backoff);
        }
    }

    fn upstream_err(&self, message: String) -> CliError {
        CliError {
            code: EXIT_FETCH_UPSTREAM,
            message,
            hint: None,
        }
    }
}

fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
