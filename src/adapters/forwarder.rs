use std::{sync::Arc, time::Instant};

use axum::{
    body::Body as AxumBody,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http::{HeaderValue, StatusCode, Uri, header};
use http_body_util::Full;
use hyper::Request;
use thiserror::Error;
use tracing::Instrument;

use crate::{
    core::{
        EndpointSelector, RelayedResponse,
        rewrite::{carries_body, frame_body, outbound_headers, target_url},
    },
    metrics,
    ports::http_client::{HttpClient, HttpClientError},
    tracing_setup::create_request_span,
};

/// Why a request could not be relayed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ForwardError {
    /// The inbound body could not be read
    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    /// No response was obtained from the selected endpoint
    #[error("{source}")]
    Upstream {
        endpoint: String,
        #[source]
        source: HttpClientError,
    },
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ForwardError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match &self {
            ForwardError::Upstream { .. } => format!("Proxy Error: {self}"),
            ForwardError::RequestBody(_) => self.to_string(),
        };
        let mut response = Response::new(AxumBody::from(message));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(AxumBody::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Forwards one inbound request to the next endpoint in rotation.
///
/// Stateless between requests; the only shared state is the selector's cursor.
/// Upstream replies of any status are relayed as-is, transport failures become
/// `502 Bad Gateway`. Nothing is retried.
pub struct Forwarder {
    selector: Arc<EndpointSelector>,
    http_client: Arc<dyn HttpClient>,
}

impl Forwarder {
    pub fn new(selector: Arc<EndpointSelector>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            selector,
            http_client,
        }
    }

    pub fn selector(&self) -> &EndpointSelector {
        &self.selector
    }

    /// Handle a request end to end, turning failures into client responses.
    pub async fn handle(&self, req: Request<AxumBody>) -> Response {
        let path = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), |pq| pq.to_string());
        let span = create_request_span(req.method().as_str(), &path);

        async move {
            let response = match self.forward(req).await {
                Ok(relayed) => relayed.into_response(),
                Err(e) => {
                    if let ForwardError::Upstream { endpoint, source } = &e {
                        tracing::error!(%endpoint, "Upstream request failed: {}", source);
                    } else {
                        tracing::warn!("{}", e);
                    }
                    e.into_response()
                }
            };
            tracing::Span::current().record("http.status_code", response.status().as_u16());
            response
        }
        .instrument(span)
        .await
    }

    /// Select an endpoint, rewrite the request for it and relay its reply.
    pub async fn forward(&self, req: Request<AxumBody>) -> Result<RelayedResponse, ForwardError> {
        let endpoint = self.selector.next();
        tracing::Span::current().record("endpoint", endpoint.name());
        tracing::info!(endpoint = %endpoint.name(), "Using API key: {}", endpoint.name());
        metrics::increment_endpoint_selection(endpoint.name());

        let (parts, body) = req.into_parts();
        let path = parts
            .uri
            .path_and_query()
            .map_or(parts.uri.path(), |pq| pq.as_str());
        let target = target_url(endpoint.base_url().as_str(), path);

        let upstream_failure = |source: HttpClientError| ForwardError::Upstream {
            endpoint: endpoint.name().to_string(),
            source,
        };

        let uri: Uri = target.parse().map_err(|e| {
            upstream_failure(HttpClientError::InvalidRequest(format!(
                "invalid target URL {target}: {e}"
            )))
        })?;
        let host = uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
            .ok_or_else(|| {
                upstream_failure(HttpClientError::InvalidRequest(format!(
                    "target URL {target} has no host"
                )))
            })?;

        let mut headers = outbound_headers(&parts.headers, host, endpoint.api_key().clone());

        let body = if carries_body(&parts.method) {
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(|e| ForwardError::RequestBody(e.to_string()))?;
            Some(bytes)
        } else {
            None
        };
        frame_body(&mut headers, body.as_ref().map(Bytes::len));

        let mut outbound = Request::new(Full::new(body.unwrap_or_default()));
        *outbound.method_mut() = parts.method;
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = headers;

        let started = Instant::now();
        match self.http_client.send_request(outbound).await {
            Ok(response) => {
                metrics::record_upstream_request(
                    endpoint.name(),
                    response.status().as_u16(),
                    started.elapsed(),
                );
                Ok(RelayedResponse::from_upstream(response))
            }
            Err(source) => {
                metrics::record_upstream_request(
                    endpoint.name(),
                    StatusCode::BAD_GATEWAY.as_u16(),
                    started.elapsed(),
                );
                Err(upstream_failure(source))
            }
        }
    }
}
