use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for HTTP client operations.
///
/// Every variant is a transport-level failure: no HTTP status was obtained from
/// the upstream. An upstream that answers with an error status is a successful
/// exchange and is returned as `Ok`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when connection to the upstream fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when the exchange does not finish in time
    #[error("Timeout error after {0} seconds")]
    Timeout(u64),

    /// Error when the outbound request cannot be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error when the upstream reply cannot be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for sending requests upstream
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send a fully buffered request and return the fully buffered reply
    ///
    /// # Arguments
    /// * `req` - Request with an absolute URI pointing at the upstream
    ///
    /// # Returns
    /// The upstream response (any status) or a transport error
    async fn send_request(&self, req: Request<Full<Bytes>>) -> HttpClientResult<Response<Bytes>>;
}
