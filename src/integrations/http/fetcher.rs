// src/integrations/http/fetcher.rs
//
// Rate-Limited Fetcher
//
// CRITICAL RULES:
// - Throttling responses (HTTP 429 or a provider-specific signal) are retried
//   after 2^attempt * base_delay, up to `max_attempts` attempts in total
// - Every other failure propagates on the first occurrence
// - Stateless: one instance is shared by all adapters
// - No unbounded retry, ever

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::FetchError;

/// Decides whether a response is a throttling signal.
pub type ThrottleSignal = fn(&HttpResponse) -> bool;

fn too_many_requests(response: &HttpResponse) -> bool {
    response.is_too_many_requests()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    /// Delay after the throttled attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Clone)]
pub struct RateLimitedFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    throttle_signal: ThrottleSignal,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            throttle_signal: too_many_requests,
        }
    }

    /// Replace the default "HTTP 429" throttling detection.
    pub fn with_throttle_signal(mut self, signal: ThrottleSignal) -> Self {
        self.throttle_signal = signal;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let attempts = self.policy.attempts();

        for attempt in 0..attempts {
            let response = self.transport.send(request).await?;

            if (self.throttle_signal)(&response) {
                if attempt + 1 < attempts {
                    let delay = self.policy.delay_for(attempt);
                    log::info!(
                        "throttled by {} (attempt {}/{}), retrying in {:?}",
                        request.url,
                        attempt + 1,
                        attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            if !response.is_success() {
                return Err(FetchError::Status {
                    status: response.status,
                    body: response.body,
                });
            }

            return Ok(response);
        }

        log::warn!("{} still throttled after {} attempts", request.url, attempts);
        Err(FetchError::Unavailable { attempts })
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &HttpRequest) -> Result<T, FetchError> {
        self.fetch(request).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::http::testing::ScriptedTransport;

    fn fetcher(transport: Arc<ScriptedTransport>, max_attempts: u32) -> RateLimitedFetcher {
        RateLimitedFetcher::new(transport, RetryPolicy::new(max_attempts, Duration::ZERO))
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        // no overflow panic on absurd attempts
        assert!(policy.delay_for(80) >= policy.delay_for(2));
    }

    #[tokio::test]
    async fn test_always_throttled_makes_exactly_max_attempts() {
        let transport = Arc::new(ScriptedTransport::always(HttpResponse::new(429, "")));
        let result = fetcher(transport.clone(), 3)
            .fetch(&HttpRequest::get("https://p.test/search"))
            .await;

        assert_eq!(result, Err(FetchError::Unavailable { attempts: 3 }));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_throttle() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("p.test", 429, "")
                .respond("p.test", 200, "ok"),
        );
        let response = fetcher(transport.clone(), 3)
            .fetch(&HttpRequest::get("https://p.test/info"))
            .await
            .unwrap();

        assert_eq!(response.body, "ok");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_other_http_errors_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::always(HttpResponse::new(500, "down")));
        let result = fetcher(transport.clone(), 3)
            .fetch(&HttpRequest::get("https://p.test/info"))
            .await;

        assert_eq!(
            result,
            Err(FetchError::Status {
                status: 500,
                body: "down".to_string()
            })
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_retried() {
        let transport = Arc::new(
            ScriptedTransport::new().fail("p.test", FetchError::Transport("reset".to_string())),
        );
        let result = fetcher(transport.clone(), 3)
            .fetch(&HttpRequest::get("https://p.test/info"))
            .await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_throttle_signal() {
        fn cloudflare_wall(response: &HttpResponse) -> bool {
            response.status == 503 && response.body.contains("rate limit")
        }

        let transport = Arc::new(ScriptedTransport::always(HttpResponse::new(
            503,
            "rate limit exceeded",
        )));
        let result = fetcher(transport.clone(), 2)
            .with_throttle_signal(cloudflare_wall)
            .fetch(&HttpRequest::get("https://p.test/info"))
            .await;

        assert_eq!(result, Err(FetchError::Unavailable { attempts: 2 }));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let transport = Arc::new(ScriptedTransport::always(HttpResponse::new(200, "{}")));
        let value: serde_json::Value = fetcher(transport.clone(), 0)
            .fetch_json(&HttpRequest::get("https://p.test/info"))
            .await
            .unwrap();
        assert!(value.is_object());
        assert_eq!(transport.calls(), 1);
    }
}
