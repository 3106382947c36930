use async_trait::async_trait;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::body::{Body, StreamBody};
use super::config::{EdgarConfig, EdgarUrls};
use super::error::{EdgarError, Result};
use super::traits::Transport;

const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Rate-limited HTTP transport for SEC.gov.
///
/// The SEC asks automated clients to stay under 10 requests per second and to
/// identify themselves with a descriptive `User-Agent`. Every request waits on
/// a shared token bucket first:
///
/// ```text
/// Token Bucket (capacity: rate_limit tokens)
/// ┌──────────────────────────┐
/// │ ████████████████████████ │  ← Tokens refill at rate_limit/sec
/// └──────────────────────────┘
///      ↓ consume on request
/// ```
///
/// HTTP 429 responses and connection failures are retried with exponential
/// backoff and jitter, up to `max_retries` times. Any other non-success status
/// is returned immediately as [`EdgarError::Status`]. Successful bodies are
/// streamed, never buffered.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    rate_limiter: Arc<Governor>,
    max_retries: u32,
}

impl HttpTransport {
    /// Builds the transport from the user agent, timeout, rate limit and
    /// retry settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::ConfigError` if the user agent is not a valid
    /// header value, the rate limit is zero, or the HTTP client cannot be built.
    pub fn new(config: &EdgarConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| EdgarError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            // Per read, not per request: a partition body may stay open for minutes
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| EdgarError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.rate_limit).ok_or_else(|| {
                EdgarError::ConfigError("Rate limit must be greater than zero".to_string())
            })?,
        )));

        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
        })
    }

    /// Calculates the wait duration for retry attempts using exponential backoff with jitter.
    ///
    /// The formula is `(2^retry × 1000ms) ± 20%`, so waits grow 1s, 2s, 4s, 8s, 16s.
    fn calculate_backoff(retry: u32) -> Duration {
        let backoff_ms = INITIAL_BACKOFF_MS * (2_u64.pow(retry));
        // Add some jitter (±20% of the calculated backoff)
        let jitter = (backoff_ms as f64 * 0.2 * (fastrand::f64() - 0.5)) as i64;
        Duration::from_millis((backoff_ms as i64 + jitter) as u64)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, url: &str) -> Result<Body> {
        let mut retries = 0;

        loop {
            self.rate_limiter.until_ready().await;

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    if retries >= self.max_retries {
                        return Err(EdgarError::RequestError(e));
                    }
                    let backoff = Self::calculate_backoff(retries);
                    tracing::warn!(
                        "Request failed for {}: {:?}. Attempt {}/{}. Retrying in {:?}.",
                        url,
                        e,
                        retries + 1,
                        self.max_retries + 1,
                        backoff
                    );
                    sleep(backoff).await;
                    retries += 1;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                tracing::debug!("Streaming {} ({})", url, status);
                return Ok(Box::pin(StreamBody::new(response.bytes_stream())));
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.max_retries {
                    return Err(EdgarError::RateLimitExceeded {
                        url: url.to_string(),
                    });
                }

                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| Self::calculate_backoff(retries));

                tracing::warn!(
                    "Rate limit hit (429) for {}. Attempt {}/{}. Waiting for {:?} before retry.",
                    url,
                    retries + 1,
                    self.max_retries + 1,
                    retry_after
                );
                sleep(retry_after).await;
                retries += 1;
                continue;
            }

            return Err(EdgarError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
    }
}

/// Client for the EDGAR full-index archive and filing documents.
///
/// `Edgar` owns nothing but a transport handle and the archive base URL, so it
/// is cheap to clone and safe to share between tasks. There is no process-wide
/// default instance: build one at startup and pass it around, or build several
/// with different transports (tests use an in-memory one).
///
/// # Examples
///
/// Basic client initialization:
///
/// ```rust
/// # use edgarstream::Edgar;
/// let edgar = Edgar::new("my_app/1.0 (my@email.com)")?;
/// # Ok::<(), edgarstream::EdgarError>(())
/// ```
///
/// With custom configuration:
///
/// ```rust
/// # use edgarstream::{Edgar, EdgarConfig, EdgarUrls};
/// # use std::time::Duration;
/// let config = EdgarConfig {
///     user_agent: "custom_app/2.0".to_string(),
///     rate_limit: 5,
///     timeout: Duration::from_secs(60),
///     max_retries: 3,
///     base_urls: EdgarUrls::default(),
/// };
/// let edgar = Edgar::with_config(config)?;
/// # Ok::<(), edgarstream::EdgarError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Edgar {
    /// Transport used for every request
    pub(crate) transport: Arc<dyn Transport>,

    /// Base URL for EDGAR archives
    pub(crate) edgar_archives_url: String,
}

impl Edgar {
    /// Creates a new Edgar client with sensible defaults.
    ///
    /// The client is rate limited to 10 requests per second with a 30-second
    /// request timeout and talks to the public SEC.gov archive. The SEC
    /// requires the user agent to identify your application and a contact,
    /// e.g. `"AppName/Version (contact@email.com)"`.
    pub fn new(user_agent: &str) -> Result<Self> {
        let config = EdgarConfig {
            user_agent: user_agent.to_string(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Creates an Edgar client backed by an [`HttpTransport`] built from `config`.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::ConfigError` if the user agent is malformed, the
    /// rate limit is zero, or the HTTP client cannot be constructed.
    pub fn with_config(config: EdgarConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config.base_urls, transport))
    }

    /// Creates an Edgar client on top of any [`Transport`].
    pub fn with_transport(base_urls: EdgarUrls, transport: impl Transport + 'static) -> Self {
        Edgar {
            transport: Arc::new(transport),
            edgar_archives_url: base_urls.archives.trim_end_matches('/').to_string(),
        }
    }

    /// Opens `url` through the configured transport.
    pub async fn open(&self, url: &str) -> Result<Body> {
        self.transport.open(url).await
    }

    /// Returns the base URL for EDGAR archives.
    pub fn archives_url(&self) -> &str {
        &self.edgar_archives_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff() {
        let backoff0 = HttpTransport::calculate_backoff(0);
        let backoff1 = HttpTransport::calculate_backoff(1);
        let backoff2 = HttpTransport::calculate_backoff(2);

        // Check that backoff increases exponentially
        assert!(backoff0 < backoff1);
        assert!(backoff1 < backoff2);

        // Check that backoff is roughly within expected range
        assert!(backoff0.as_millis() >= 800 && backoff0.as_millis() <= 1200); // ±20% of 1000ms
        assert!(backoff1.as_millis() >= 1600 && backoff1.as_millis() <= 2400); // ±20% of 2000ms
        assert!(backoff2.as_millis() >= 3200 && backoff2.as_millis() <= 4800); // ±20% of 4000ms
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = EdgarConfig {
            rate_limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            Edgar::with_config(config),
            Err(EdgarError::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_user_agent_is_rejected() {
        assert!(matches!(
            Edgar::new("bad\nagent"),
            Err(EdgarError::ConfigError(_))
        ));
    }

    #[test]
    fn test_archives_url_trailing_slash() {
        let config = EdgarConfig {
            base_urls: EdgarUrls {
                archives: "http://localhost:8080/Archives/".to_string(),
            },
            ..Default::default()
        };
        let edgar = Edgar::with_config(config).unwrap();
        assert_eq!(edgar.archives_url(), "http://localhost:8080/Archives");
    }
}
