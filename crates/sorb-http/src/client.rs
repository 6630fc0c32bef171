use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
///
/// This type alias simplifies the stream type used throughout the workspace.
/// The stream yields `Result<Bytes, E>` where `E` is the error type of the
/// HTTP client that opened the response.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// An opened, unread HTTP response body.
///
/// This is the hand-off shape between the transport layer and the
/// materializer: a one-shot byte stream plus the expected total size from
/// the Content-Length header, when the server declared one. The length is
/// informational only; consumers must never use it to bound reads.
pub struct InFlight<E> {
    /// The unread body stream. Reading it consumes the connection.
    pub stream: BoxStream<'static, Result<Bytes, E>>,
    /// Expected total body size in bytes, `None` when unknown
    /// (chunked encoding, missing header).
    pub content_length: Option<u64>,
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed to obtain response
/// bodies. Implementations handle their own redirect following, timeout
/// configuration, and error mapping.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET request and return the in-flight response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (DNS failure, connection
    /// error, non-success HTTP status, etc.). Implementations should
    /// surface error statuses here rather than as a body.
    fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<InFlight<Self::Error>, Self::Error>> + Send;

    /// Query the Content-Length header without downloading the body.
    ///
    /// Returns `Ok(Some(n))` if Content-Length is present, `Ok(None)` if
    /// absent or the server uses chunked encoding.
    fn head(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use tracing::debug;

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new client with default configuration.
        pub fn new() -> Self {
            Self {
                client: reqwest::Client::new(),
            }
        }

        /// Wrap an already-configured reqwest client.
        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl Default for ReqwestClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn open(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<InFlight<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            debug!("opening {url}");
            let response = request.send().await?.error_for_status()?;
            let content_length = response.content_length();

            Ok(InFlight {
                stream: Box::pin(response.bytes_stream()),
                content_length,
            })
        }

        async fn head(&self, url: &str) -> Result<Option<u64>, Self::Error> {
            let response = self.client.head(url).send().await?.error_for_status()?;
            let content_length = response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            Ok(content_length)
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
