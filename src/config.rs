use std::time::Duration;

/// Configuration for the Edgar client
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Rate limit in requests per second
    pub rate_limit: u32,
    /// HTTP request timeout
    pub timeout: Duration,
    /// How many times a throttled or failed request is retried
    pub max_retries: u32,
    /// Base URLs for EDGAR services
    pub base_urls: EdgarUrls,
}

/// Base URLs for EDGAR services
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    /// Base URL for EDGAR archives, without a trailing slash.
    ///
    /// Index partitions live under `{archives}/edgar/full-index/` and filing
    /// documents under `{archives}/{filename}`.
    pub archives: String,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("edgarstream/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit: 10,
            timeout: Duration::from_secs(30),
            max_retries: 5,
            base_urls: EdgarUrls::default(),
        }
    }
}

impl EdgarConfig {
    /// Creates a new EdgarConfig with custom settings
    ///
    /// # Basic usage
    ///
    /// ```rust
    /// use edgarstream::{Edgar, EdgarConfig};
    /// use std::time::Duration;
    ///
    /// let config = EdgarConfig::new(
    ///     "YourAppName contact@example.com",
    ///     5, // requests per second
    ///     Duration::from_secs(60),
    ///     None,
    /// );
    /// let edgar = Edgar::with_config(config)?;
    /// # Ok::<(), edgarstream::EdgarError>(())
    /// ```
    pub fn new(
        user_agent: impl Into<String>,
        rate_limit: u32,
        timeout: Duration,
        base_urls: Option<EdgarUrls>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            rate_limit,
            timeout,
            base_urls: base_urls.unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Overrides the retry budget for throttled or failed requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives".to_string(),
        }
    }
}

impl EdgarUrls {
    /// Points every service at a single host, e.g. a local fixture server.
    pub fn with_archives(archives: impl Into<String>) -> Self {
        Self {
            archives: archives.into().trim_end_matches('/').to_string(),
        }
    }
}
