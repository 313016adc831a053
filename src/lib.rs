//! Rotor - a round-robin reverse proxy for keyed API endpoints.
//!
//! Rotor spreads inbound HTTP requests over a fixed, ordered pool of upstream
//! endpoints. Every request goes to the next endpoint in rotation with that
//! endpoint's credential injected into the `x-goog-api-key` header, and the
//! upstream reply (error statuses included) is relayed back unchanged apart
//! from the `Transfer-Encoding` / `Content-Encoding` headers.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use rotor::{EndpointPool, EndpointSelector, Forwarder, HttpClientAdapter, config};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let cfg = config::load_config("config.json").await?;
//! config::ConfigValidator::validate(&cfg)?;
//! let selector = Arc::new(EndpointSelector::new(EndpointPool::from_configs(&cfg.api_configs)?));
//! let forwarder = Arc::new(Forwarder::new(selector, Arc::new(HttpClientAdapter::new()?)));
//! let app = rotor::adapters::router(forwarder);
//! # let _ = app;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! Same split as a hexagonal service: `core` holds the endpoint pool, the
//! round-robin selector and the pure header rewriting rules; `ports` declares
//! the upstream client and server traits; `adapters` implements them on top of
//! hyper and axum.
//!
//! # Error Handling
//! Domain errors are `thiserror` enums. Startup and configuration paths return
//! `eyre::Result` with context attached.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{ForwardError, Forwarder, HttpClientAdapter, ProxyServer},
    core::{Endpoint, EndpointPool, EndpointSelector, RelayedResponse},
    ports::{http_client::HttpClient, http_server::HttpServer},
    utils::GracefulShutdown,
};
