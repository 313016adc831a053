use std::{future::ready, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use eyre::Result;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response, StatusCode, header};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tower::{ServiceExt, service_fn};
use tower_http::decompression::Decompression;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

type UpstreamClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP client adapter using Hyper with Rustls.
///
/// Responsibilities:
/// * Speaks HTTP/1.1 to `http://` and `https://` upstreams
/// * Buffers the full reply, optionally bounded by a timeout
/// * Decodes compressed bodies so they can be relayed without
///   `Content-Encoding`, falling back to the bytes as received
///
/// Headers on the outbound request are sent as given; `Host` is only filled
/// in by hyper when the caller left it out.
pub struct HttpClientAdapter {
    client: UpstreamClient,
    timeout: Option<Duration>,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter without an upstream timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Create a new HTTP client adapter; `timeout` bounds the whole exchange.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https_connector);

        tracing::debug!(?timeout, "Created upstream HTTP client");
        Ok(Self { client, timeout })
    }

    async fn exchange(&self, req: Request<Full<Bytes>>) -> HttpClientResult<Response<Bytes>> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = self.client.request(req).await.map_err(|e| {
            HttpClientError::ConnectionError(format!("Request to {method} {uri} failed: {e}"))
        })?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| {
                HttpClientError::InvalidResponse(format!(
                    "Reading response from {method} {uri} failed: {e}"
                ))
            })?
            .to_bytes();
        let raw = Response::from_parts(parts, body);

        if !has_decodable_body(&method, raw.status()) {
            return Ok(raw);
        }
        Ok(decode_body(raw).await)
    }
}

/// `HEAD` replies and `204`/`304` statuses carry no payload; their
/// `Content-Length` describes a body that was never sent and is relayed as is.
fn has_decodable_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

/// Decode a buffered body according to its `Content-Encoding`.
///
/// The upstream already answered, so a body that fails to decode is relayed
/// as received instead of turning the exchange into a transport error.
async fn decode_body(raw: Response<Bytes>) -> Response<Bytes> {
    if !raw.headers().contains_key(header::CONTENT_ENCODING) {
        return raw;
    }

    let mut encoded = Response::new(Full::new(raw.body().clone()));
    *encoded.status_mut() = raw.status();
    *encoded.version_mut() = raw.version();
    *encoded.headers_mut() = raw.headers().clone();

    let mut pending = Some(encoded);
    let decoder = Decompression::new(service_fn(move |_: Request<()>| {
        ready(pending.take().ok_or("buffered response already taken"))
    }));

    let decoded = match decoder.oneshot(Request::new(())).await {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Could not prepare upstream body for decoding: {}", e);
            return raw;
        }
    };

    let (parts, body) = decoded.into_parts();
    match body.collect().await {
        Ok(collected) => Response::from_parts(parts, collected.to_bytes()),
        Err(e) => {
            tracing::warn!(
                encoding = ?raw.headers().get(header::CONTENT_ENCODING),
                "Upstream body could not be decoded, relaying it as received: {}",
                e
            );
            raw
        }
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(&self, req: Request<Full<Bytes>>) -> HttpClientResult<Response<Bytes>> {
        if req.uri().host().is_none() {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(format!(
                "Outgoing URI has no host: {}",
                req.uri()
            )));
        }

        tracing::debug!(
            method = %req.method(),
            uri = %req.uri(),
            headers = ?req.headers(),
            "Sending upstream request"
        );

        match self.timeout {
            Some(limit) => match timeout(limit, self.exchange(req)).await {
                Ok(result) => result,
                Err(_) => Err(HttpClientError::Timeout(limit.as_secs())),
            },
            None => self.exchange(req).await,
        }
    }
}
