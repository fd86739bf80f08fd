//! Maintenance-aware HTTP transport.
//!
//! Every registry call goes through [`RetryTransport`]. Responses with a
//! maintenance status (502, 503, 504) are retried with exponential backoff;
//! any other error status is translated into a [`SweepError`] right away.
//! Response bodies are read in full here and handed back as a [`Reply`].

use crate::error::{Result, SweepError};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Request, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, info};


/// Statuses the registry returns while it is in maintenance.
pub const RETRYABLE_STATUSES: [StatusCode; 3] = [
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Backoff schedule for maintenance responses.
///
/// The n-th retry (starting at 1) sleeps `min(2^n, max_backoff)` units.
///
/// # Examples
///
/// ```
/// use libsweep::transport::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_for(3), Duration::from_secs(8));
/// assert_eq!(policy.delay_for(6), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Cap of a single sleep, in units.
    pub max_backoff: u64,
    /// Length of one backoff unit.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_backoff: 30,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with one-second units.
    pub fn new(max_retries: u32, max_backoff: u64) -> Self {
        Self {
            max_retries,
            max_backoff,
            ..Self::default()
        }
    }

    /// Sets the length of one backoff unit.
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Returns how long to sleep before retry number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt).min(self.max_backoff);
        self.unit
            .saturating_mul(u32::try_from(factor).unwrap_or(u32::MAX))
    }

    /// Returns the sleep before each retry, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retries).map(|retry| self.delay_for(retry))
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    url: String,
    body: Vec<u8>,
}

impl Reply {
    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the final request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            SweepError::validation_with_source(
                format!("Failed to parse response from {}", self.url),
                e,
            )
        })
    }
}

/// Outcome of a single attempt.
enum Attempt {
    /// A final answer: success, or an error status that must not be retried.
    Complete(Result<Reply>),
    /// The service is in maintenance.
    Transient(StatusCode),
}

/// HTTP transport that retries maintenance responses.
#[derive(Debug, Clone)]
pub struct RetryTransport {
    http_client: ReqwestClient,
    policy: RetryPolicy,
    echo_bodies: bool,
}

impl RetryTransport {
    /// Wraps a configured reqwest client.
    pub fn new(http_client: ReqwestClient, policy: RetryPolicy) -> Self {
        Self {
            http_client,
            policy,
            echo_bodies: false,
        }
    }

    /// Logs every decoded response body. Diagnostic only.
    pub fn with_echo_bodies(mut self, echo: bool) -> Self {
        self.echo_bodies = echo;
        self
    }

    /// Returns the underlying client, used to build requests.
    pub fn http_client(&self) -> &ReqwestClient {
        &self.http_client
    }

    /// Builds and sends a request.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Reply> {
        let request = builder
            .build()
            .map_err(|e| SweepError::network_with_source("Failed to build request", e))?;
        self.execute(request).await
    }

    /// Sends a request, retrying while the service reports maintenance.
    ///
    /// # Errors
    ///
    /// - [`SweepError::Unavailable`] once `max_retries` retries all got a
    ///   maintenance status
    /// - the translated error of any other non-success status, immediately
    /// - [`SweepError::Network`] for connection failures and timeouts
    pub async fn execute(&self, request: Request) -> Result<Reply> {
        let url = request.url().to_string();
        let mut delays = self.policy.delays();
        let mut attempts: u32 = 0;

        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| SweepError::validation("Request body cannot be replayed"))?;
            attempts += 1;

            match self.attempt(attempt).await? {
                Attempt::Complete(outcome) => return outcome,
                Attempt::Transient(status) => {
                    let Some(delay) = delays.next() else {
                        error!(
                            url = %url,
                            status = status.as_u16(),
                            attempts,
                            "API endpoint still in maintenance, giving up"
                        );
                        return Err(SweepError::unavailable(status.as_u16(), attempts, url));
                    };

                    info!(
                        url = %url,
                        status = status.as_u16(),
                        retry = attempts,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "API endpoint in maintenance, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, request: Request) -> Result<Attempt> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(translate_reqwest_error)?;

        let status = response.status();
        if RETRYABLE_STATUSES.contains(&status) {
            return Ok(Attempt::Transient(status));
        }

        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            SweepError::network_with_source(format!("Failed to read response from {}", url), e)
        })?;

        if self.echo_bodies {
            echo_body(&url, status, &body);
        }

        let reply = Reply {
            status,
            url,
            body: body.to_vec(),
        };

        if status.is_success() {
            Ok(Attempt::Complete(Ok(reply)))
        } else {
            Ok(Attempt::Complete(Err(translate_status(&reply, &headers))))
        }
    }
}

fn echo_body(url: &str, status: StatusCode, body: &[u8]) {
    let rendered = serde_json::from_slice::<serde_json::Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    info!(url = %url, status = status.as_u16(), "response body:\n{}", rendered);
}

/// Translates a reqwest error into a SweepError.
fn translate_reqwest_error(error: reqwest::Error) -> SweepError {
    let target = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "registry".to_string());

    if error.is_timeout() {
        SweepError::network_with_source(format!("Request to {} timed out", target), error)
    } else if error.is_connect() {
        SweepError::network_with_source(format!("Failed to connect to {}", target), error)
    } else {
        SweepError::network_with_source(
            format!("Network error communicating with {}", target),
            error,
        )
    }
}

/// Maps a non-success, non-retryable reply to an error.
fn translate_status(reply: &Reply, headers: &HeaderMap) -> SweepError {
    let url = reply.url();
    let body = String::from_utf8_lossy(reply.body());

    match reply.status() {
        StatusCode::UNAUTHORIZED => SweepError::authentication(
            format!("Authentication required for {}: {}", url, body),
            Some(401),
        ),
        StatusCode::FORBIDDEN => SweepError::authentication(
            format!("Access forbidden for {}: {}", url, body),
            Some(403),
        ),
        StatusCode::NOT_FOUND => SweepError::not_found("endpoint", format!("{}: {}", url, body)),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            SweepError::rate_limit(
                format!("Rate limit exceeded for {}: {}", url, body),
                retry_after,
            )
        }
        status => SweepError::server(
            format!("HTTP {} from {}: {}", status.as_u16(), url, body),
            status.as_u16(),
        ),
    }
}
