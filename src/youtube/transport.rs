//! Rate-limited retrying HTTP transport
//!
//! This module issues every upstream call for the catalog builder:
//! - One global pacing gate enforcing minimum spacing between calls,
//!   process-wide, so logically parallel work is still serialized at the
//!   network boundary
//! - Exponential backoff on transient failures up to an attempt limit
//! - Immediate failure on fatal request errors
//! - An audit row for every attempt, carrying the real call cost

use crate::config::ApiConfig;
use crate::storage::{AuditEntry, SqliteStorage, Storage};
use crate::youtube::{ApiError, ApiResult};
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Retry behavior for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            backoff_factor: config.retry_backoff_factor,
        }
    }

    /// Delay before the next attempt, after `attempt` attempts have failed
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let delay = self.base_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}

/// How a single HTTP attempt went
#[derive(Debug)]
enum AttemptOutcome {
    Success {
        status: u16,
        body: String,
    },
    Transient {
        status: Option<u16>,
        message: String,
    },
    Fatal {
        status: u16,
        message: String,
    },
}

/// Classifies a completed HTTP response
///
/// 429 and quota-flavored 403s are rate-limit signals, 5xx are server
/// faults; both are worth retrying. Any other non-success status is a
/// request error and is not.
fn classify_response(status: u16, body: &str) -> AttemptOutcome {
    if (200..300).contains(&status) {
        return AttemptOutcome::Success {
            status,
            body: body.to_string(),
        };
    }

    let quota_flavored = status == 403 && body.to_lowercase().contains("quota");
    if status == 429 || status >= 500 || quota_flavored {
        return AttemptOutcome::Transient {
            status: Some(status),
            message: format!("HTTP {}", status),
        };
    }

    AttemptOutcome::Fatal {
        status,
        message: truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < LIMIT)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    }
}

/// The single component performing network I/O
pub struct Transport {
    client: Client,
    base_url: String,
    api_key: String,
    spacing: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
    retry: RetryPolicy,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl Transport {
    /// Builds the transport and its HTTP client
    pub fn new(
        config: &ApiConfig,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(format!("crate-digger/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            spacing: Duration::from_millis(config.request_spacing_ms),
            last_call: tokio::sync::Mutex::new(None),
            retry: RetryPolicy::from_config(config),
            storage,
        })
    }

    /// Sends one API call, retrying transient failures with backoff
    ///
    /// Every attempt is recorded in the audit log with the operation's real
    /// cost before the outcome is acted on.
    pub async fn send(
        &self,
        operation: &str,
        cost: u32,
        signature: &str,
        params: &[(&str, String)],
    ) -> ApiResult<String> {
        let mut last_message = String::new();

        for attempt in 1..=self.retry.max_attempts {
            self.pace().await;

            let outcome = self.attempt(operation, params).await;
            self.record_attempt(operation, signature, cost, &outcome)?;

            match outcome {
                AttemptOutcome::Success { body, .. } => return Ok(body),
                AttemptOutcome::Fatal { status, message } => {
                    return Err(ApiError::Fatal {
                        operation: operation.to_string(),
                        message: format!("HTTP {}: {}", status, message),
                    });
                }
                AttemptOutcome::Transient { status, message } => {
                    last_message = message;
                    if attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_after_attempt(attempt);
                        tracing::warn!(
                            "Transient failure in {} (attempt {}/{}, status {:?}), retrying in {:?}",
                            operation,
                            attempt,
                            self.retry.max_attempts,
                            status,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ApiError::Transient {
            operation: operation.to_string(),
            message: format!(
                "{} (after {} attempts)",
                last_message, self.retry.max_attempts
            ),
        })
    }

    /// Waits out the global pacing gate and claims the next call slot
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// behind one another instead of stampeding.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.spacing {
                tokio::time::sleep(self.spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Issues one HTTP request and classifies the outcome
    async fn attempt(&self, operation: &str, params: &[(&str, String)]) -> AttemptOutcome {
        let url = format!("{}/{}", self.base_url, operation);
        let mut query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("key", self.api_key.as_str()));

        match self.client.get(&url).query(&query).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => classify_response(status, &body),
                    Err(e) => AttemptOutcome::Transient {
                        status: Some(status),
                        message: format!("failed reading response body: {}", e),
                    },
                }
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    e.to_string()
                };
                AttemptOutcome::Transient {
                    status: None,
                    message,
                }
            }
        }
    }

    /// Appends the audit row for one attempt
    fn record_attempt(
        &self,
        operation: &str,
        signature: &str,
        cost: u32,
        outcome: &AttemptOutcome,
    ) -> ApiResult<()> {
        let (http_status, error) = match outcome {
            AttemptOutcome::Success { status, .. } => (Some(*status), None),
            AttemptOutcome::Transient { status, message } => (*status, Some(message.clone())),
            AttemptOutcome::Fatal { status, message } => (Some(*status), Some(message.clone())),
        };

        let mut storage = self.storage.lock().unwrap();
        storage.append_audit(&AuditEntry {
            operation: operation.to_string(),
            signature: signature.to_string(),
            cost,
            cache_hit: false,
            http_status,
            error,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = policy();
        assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after_attempt(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = policy();
        assert_eq!(policy.delay_after_attempt(10), Duration::from_millis(8000));
    }

    #[test]
    fn test_success_statuses() {
        assert!(matches!(
            classify_response(200, "{}"),
            AttemptOutcome::Success { .. }
        ));
        assert!(matches!(
            classify_response(204, ""),
            AttemptOutcome::Success { .. }
        ));
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(matches!(
            classify_response(500, "oops"),
            AttemptOutcome::Transient { .. }
        ));
        assert!(matches!(
            classify_response(503, ""),
            AttemptOutcome::Transient { .. }
        ));
    }

    #[test]
    fn test_rate_limit_signals_are_transient() {
        assert!(matches!(
            classify_response(429, ""),
            AttemptOutcome::Transient { .. }
        ));
        assert!(matches!(
            classify_response(403, r#"{"error":{"errors":[{"reason":"quotaExceeded"}]}}"#),
            AttemptOutcome::Transient { .. }
        ));
    }

    #[test]
    fn test_plain_client_errors_are_fatal() {
        assert!(matches!(
            classify_response(400, "bad request"),
            AttemptOutcome::Fatal { .. }
        ));
        assert!(matches!(
            classify_response(404, "not found"),
            AttemptOutcome::Fatal { .. }
        ));
        assert!(matches!(
            classify_response(403, "forbidden"),
            AttemptOutcome::Fatal { .. }
        ));
    }
}
