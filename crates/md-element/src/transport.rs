//! Network transport for remote markdown sources.
//!
//! [`Transport`] performs one blocking GET; the element runs it on a worker
//! thread. [`HttpTransport`] handles `http(s)://` through ureq and reads
//! `file://` URLs and bare paths from disk, reporting status 0 for them.

use std::path::Path;
use std::time::Duration;

use ureq::Agent;

/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Media type requested for remote sources.
pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";

/// A GET request for a markdown document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// GET request with `Accept: text/markdown`.
    #[must_use]
    pub fn markdown(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("Accept".to_owned(), MARKDOWN_MEDIA_TYPE.to_owned())],
        }
    }

    /// Value of the first header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response to a [`FetchRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status, or 0 for file access.
    pub status: u16,
    pub body: String,
}

/// Error performing a fetch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL scheme not supported by the transport.
    #[error("unsupported URL: {0}")]
    InvalidUrl(String),

    /// Worker thread went away without reporting a result.
    #[error("fetch worker disconnected")]
    Disconnected,
}

/// Performs a single blocking GET.
pub trait Transport: Send + Sync {
    /// Send the request and return the response.
    ///
    /// Non-2xx statuses are responses, not errors.
    fn send(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// Transport backed by a ureq [`Agent`] and the local filesystem.
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /// Create a transport with the given HTTP timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
        }
    }

    fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.call()?;
        let status = response.status().as_u16();
        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string()?;
        Ok(FetchResponse { status, body })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        match classify(&request.url) {
            Location::Http => self.get(request),
            Location::File(path) => {
                let body = std::fs::read_to_string(path)?;
                Ok(FetchResponse { status: 0, body })
            }
            Location::Unsupported => Err(TransportError::InvalidUrl(request.url.clone())),
        }
    }
}

/// Create an HTTP agent that reports error statuses as responses.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

#[derive(Debug, PartialEq, Eq)]
enum Location<'a> {
    Http,
    File(&'a Path),
    Unsupported,
}

fn classify(url: &str) -> Location<'_> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Location::Http
    } else if let Some(path) = url.strip_prefix("file://") {
        Location::File(Path::new(path))
    } else if url.contains("://") || url.is_empty() {
        Location::Unsupported
    } else {
        Location::File(Path::new(url))
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::{FetchRequest, FetchResponse, Transport, TransportError};

    /// In-memory transport for testing.
    ///
    /// Unknown URLs answer 404. Every request is recorded.
    ///
    /// ```ignore
    /// let transport = MockTransport::new()
    ///     .with_response("https://example.com/readme.md", 200, "# Readme");
    /// ```
    #[derive(Debug, Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, FetchResponse>>,
        failures: Mutex<Vec<String>>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl MockTransport {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `url` with the given status and body.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        pub fn with_response(self, url: &str, status: u16, body: &str) -> Self {
            self.responses.lock().unwrap().insert(
                url.to_owned(),
                FetchResponse {
                    status,
                    body: body.to_owned(),
                },
            );
            self
        }

        /// Fail requests for `url` at the transport level.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        pub fn with_failure(self, url: &str) -> Self {
            self.failures.lock().unwrap().push(url.to_owned());
            self
        }

        /// Requests received so far.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[must_use]
        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.failures.lock().unwrap().contains(&request.url) {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| FetchResponse {
                    status: 404,
                    body: "Not Found".to_owned(),
                }))
        }
    }
}
