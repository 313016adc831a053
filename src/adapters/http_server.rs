use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{Request, State},
    response::Response,
    routing::get,
};
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;

use crate::{adapters::Forwarder, ports::http_server::HttpServer, utils::GracefulShutdown};

/// Build the proxy router: `GET` and `POST` on every path go to the forwarder.
///
/// Other methods are answered by axum's method router with
/// `405 Method Not Allowed`. `HEAD` is served by the `GET` route.
pub fn router(forwarder: Arc<Forwarder>) -> Router {
    Router::new()
        .route("/", get(forward_request).post(forward_request))
        .route("/{*path}", get(forward_request).post(forward_request))
        .with_state(forwarder)
}

async fn forward_request(State(forwarder): State<Arc<Forwarder>>, req: Request) -> Response {
    forwarder.handle(req).await
}

/// Plain HTTP listener serving the proxy router until shutdown is signalled.
pub struct ProxyServer {
    listen_addr: SocketAddr,
    forwarder: Arc<Forwarder>,
    shutdown: Arc<GracefulShutdown>,
}

impl ProxyServer {
    pub fn new(
        listen_addr: SocketAddr,
        forwarder: Arc<Forwarder>,
        shutdown: Arc<GracefulShutdown>,
    ) -> Self {
        Self {
            listen_addr,
            forwarder,
            shutdown,
        }
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .wrap_err("Failed to get local addr")?;
        tracing::info!(
            "Rotor listening on {} (round-robin across {} endpoints)",
            local_addr,
            self.forwarder.selector().len()
        );

        let shutdown = self.shutdown.clone();
        axum::serve(listener, router(self.forwarder.clone()))
            .with_graceful_shutdown(async move {
                let reason = shutdown.wait_for_shutdown_signal().await;
                tracing::info!("Shutdown signal received: {:?}", reason);
            })
            .await
            .wrap_err("Server error")
    }
}

impl HttpServer for ProxyServer {
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to {}", self.listen_addr))?;
        self.serve(listener).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::{BodyExt, Full};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        core::{Endpoint, EndpointPool, EndpointSelector},
        ports::http_client::{HttpClient, HttpClientResult},
    };

    struct EchoPathClient;

    #[async_trait]
    impl HttpClient for EchoPathClient {
        async fn send_request(
            &self,
            req: hyper::Request<Full<Bytes>>,
        ) -> HttpClientResult<http::Response<Bytes>> {
            Ok(http::Response::new(Bytes::from(req.uri().to_string())))
        }
    }

    fn test_router() -> Router {
        let endpoint = Endpoint::new("echo", "http://upstream.local", "k").unwrap();
        let selector = Arc::new(EndpointSelector::new(
            EndpointPool::new(vec![endpoint]).unwrap(),
        ));
        router(Arc::new(Forwarder::new(selector, Arc::new(EchoPathClient))))
    }

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let response = test_router()
            .oneshot(
                http::Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_and_nested_paths_are_forwarded() {
        let (status, body) = call(Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "http://upstream.local/");

        let (status, body) = call(
            Method::POST,
            "/v1beta/models/gemini-pro:generateContent?alt=sse",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "http://upstream.local/v1beta/models/gemini-pro:generateContent?alt=sse"
        );
    }

    #[tokio::test]
    async fn test_unsupported_methods_rejected() {
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, _) = call(method, "/v1/models").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let endpoint = Endpoint::new("echo", "http://upstream.local", "k").unwrap();
        let selector = Arc::new(EndpointSelector::new(
            EndpointPool::new(vec![endpoint]).unwrap(),
        ));
        let forwarder = Arc::new(Forwarder::new(selector, Arc::new(EchoPathClient)));
        let shutdown = Arc::new(GracefulShutdown::new());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ProxyServer::new(addr, forwarder, shutdown.clone());
        let handle = tokio::spawn(async move { server.serve(listener).await });

        shutdown.trigger_shutdown(crate::utils::ShutdownReason::Manual);
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
