pub mod forwarder;
pub mod http_client;
pub mod http_server;

/// Re-export commonly used types from adapters
pub use forwarder::{ForwardError, Forwarder};
pub use http_client::HttpClientAdapter;
pub use http_server::{ProxyServer, router};
