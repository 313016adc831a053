//! Pure request/response rewriting rules used by the forwarder.
//!
//! Nothing here performs I/O. The inbound header map is never mutated; each
//! function builds the header set for the other side of the proxy from it.
use bytes::Bytes;
use http::{
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    header::{CONTENT_ENCODING, CONTENT_LENGTH, HOST, TRANSFER_ENCODING},
};

/// Request header that carries the upstream credential.
pub const CREDENTIAL_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Response headers that are not relayed: the body is buffered and decoded
/// before it is sent on, so the upstream framing and encoding no longer apply.
pub const STRIPPED_RESPONSE_HEADERS: [HeaderName; 2] = [TRANSFER_ENCODING, CONTENT_ENCODING];

/// Join the endpoint base URL and the inbound path (with query) verbatim.
///
/// No slash normalization happens: `http://h/` + `/v1` yields `http://h//v1`.
pub fn target_url(base_url: &str, path_and_query: &str) -> String {
    format!("{base_url}{path_and_query}")
}

/// Whether requests with this method forward a body upstream.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Build the outbound header set: every inbound header, then `Host` set to the
/// target authority, then the credential header set to the endpoint key. Any
/// client-supplied value for either header is replaced, never merged.
pub fn outbound_headers(inbound: &HeaderMap, host: HeaderValue, api_key: HeaderValue) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.insert(HOST, host);
    headers.insert(CREDENTIAL_HEADER, api_key);
    headers
}

/// Make the framing headers describe the body that is actually sent.
///
/// The inbound body has already been read in full, so a chunked inbound
/// request goes out with a plain `Content-Length`.
pub fn frame_body(headers: &mut HeaderMap, body_len: Option<usize>) {
    headers.remove(TRANSFER_ENCODING);
    match body_len {
        Some(len) => {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        None => {
            headers.remove(CONTENT_LENGTH);
        }
    }
}

/// Copy upstream response headers minus [`STRIPPED_RESPONSE_HEADERS`].
/// Repeated headers (e.g. several `Set-Cookie`) keep every value.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if STRIPPED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Response handed back to the client, from any upstream reply.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayedResponse {
    /// Relay an upstream reply. Status and body pass through untouched, error
    /// statuses included.
    pub fn from_upstream(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: relay_headers(&parts.headers),
            body,
        }
    }
}
