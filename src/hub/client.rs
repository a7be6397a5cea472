//! Blocking HTTP client for the content-type hub.

use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::{CatalogDocument, ContentTypeSource};

/// Errors that can occur when talking to the hub.
#[derive(Debug, Error)]
pub enum HubError {
    /// Connection failures, DNS resolution, refused sockets.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request or response timed out.
    #[error("hub request timed out")]
    Timeout(#[source] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub returned status {status}")]
    Http { status: u16 },

    /// The response body was not a valid catalog document.
    #[error("malformed catalog document: {0}")]
    Document(#[source] reqwest::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid hub URL: {0}")]
    InvalidUrl(String),
}

/// Builder for constructing `HubClient` instances.
///
/// # Examples
///
/// ```
/// use lectern::hub::HubClientBuilder;
///
/// let client = HubClientBuilder::new()
///     .endpoint("https://hub.example.org/v1/content-types")
///     .build()
///     .expect("failed to create hub client");
/// ```
#[derive(Debug, Default)]
pub struct HubClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl HubClientBuilder {
    /// Creates a new `HubClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog endpoint URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the whole-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `HubClient` with the configured settings.
    ///
    /// If `endpoint()` was not called, the `LECTERN_HUB_URL` environment
    /// variable is consulted, and failing that the public hub endpoint
    /// is used.
    pub fn build(self) -> Result<HubClient, HubError> {
        let endpoint = if let Some(url) = self.endpoint {
            url
        } else {
            std::env::var("LECTERN_HUB_URL")
                .unwrap_or_else(|_| "https://api.h5p.org/v1/content-types".to_string())
        };

        reqwest::Url::parse(&endpoint)
            .map_err(|e| HubError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(HubError::Network)?;

        Ok(HubClient { client, endpoint })
    }
}

/// Synchronous HTTP client for the content-type hub.
///
/// Construct it through `HubClientBuilder`. Transient failures are
/// retried with backoff; client errors are not.
pub struct HubClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HubClient {
    /// Returns the catalog endpoint configured for this client.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch_internal(&self) -> Result<CatalogDocument, HubError> {
        retry_with_backoff(|| {
            let response = self.client.get(&self.endpoint).send().map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                return Err(HubError::Http {
                    status: status.as_u16(),
                });
            }

            response.json::<CatalogDocument>().map_err(HubError::Document)
        })
    }
}

impl ContentTypeSource for HubClient {
    fn fetch_content_types(&self) -> Result<CatalogDocument, HubError> {
        self.fetch_internal()
    }
}

fn classify(error: reqwest::Error) -> HubError {
    if error.is_timeout() {
        HubError::Timeout(error)
    } else {
        HubError::Network(error)
    }
}

/// Retries an operation with exponential backoff.
///
/// The operation runs up to 4 times in total, sleeping 1s, 2s and 4s
/// between attempts. Only transient errors are retried; anything else
/// returns immediately.
pub fn retry_with_backoff<F, T>(mut f: F) -> Result<T, HubError>
where
    F: FnMut() -> Result<T, HubError>,
{
    const DELAYS: [u64; 3] = [1, 2, 4]; // seconds

    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for &delay_secs in &DELAYS {
        thread::sleep(Duration::from_secs(delay_secs));

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Transient errors are worth another attempt: connection trouble,
/// timeouts and 5xx answers. A 4xx or a malformed document will not
/// get better by asking again.
fn should_retry(error: &HubError) -> bool {
    match error {
        HubError::Network(_) => true,
        HubError::Timeout(_) => true,
        HubError::Http { status } => *status >= 500 && *status < 600,
        HubError::Document(_) => false,
        HubError::InvalidUrl(_) => false,
    }
}
