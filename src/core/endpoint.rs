use std::{fmt, ops::Index, sync::Arc};

use http::HeaderValue;
use thiserror::Error;

use crate::config::EndpointConfig;

/// Errors raised while turning configuration records into runtime endpoints
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EndpointError {
    /// Error when the base URL is not an http(s) URL
    #[error("Invalid base URL for endpoint '{name}': {reason}")]
    InvalidBaseUrl { name: String, reason: String },

    /// Error when the credential cannot be carried in a header
    #[error("Invalid API key for endpoint '{name}': {reason}")]
    InvalidApiKey { name: String, reason: String },

    /// Error when no endpoints were configured
    #[error("Endpoint pool is empty; at least one entry in api_configs is required")]
    EmptyPool,
}

/// Result type for endpoint operations
pub type EndpointResult<T> = Result<T, EndpointError>;

/// An upstream base URL. Kept as the exact configured string because the
/// request path is appended to it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl {
    url: String,
}

impl BaseUrl {
    /// Wrap `url` after checking it starts with `http://` or `https://`.
    pub fn new(url: &str) -> Result<Self, String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "base URL must start with http:// or https://, got: {url}"
            ));
        }

        Ok(BaseUrl {
            url: url.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// A validated upstream endpoint: display name, base URL and credential.
///
/// The credential is stored as a sensitive [`HeaderValue`], so it is ready to
/// be placed on an outbound request and is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    base_url: BaseUrl,
    api_key: HeaderValue,
}

impl Endpoint {
    pub fn new(name: &str, base_url: &str, api_key: &str) -> EndpointResult<Self> {
        let base_url = BaseUrl::new(base_url).map_err(|reason| EndpointError::InvalidBaseUrl {
            name: name.to_string(),
            reason,
        })?;

        if api_key.is_empty() {
            return Err(EndpointError::InvalidApiKey {
                name: name.to_string(),
                reason: "key is empty".to_string(),
            });
        }
        let mut api_key =
            HeaderValue::from_str(api_key).map_err(|e| EndpointError::InvalidApiKey {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        api_key.set_sensitive(true);

        Ok(Self {
            name: name.to_string(),
            base_url,
            api_key,
        })
    }

    /// Display label used in logs and metrics; not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn api_key(&self) -> &HeaderValue {
        &self.api_key
    }
}

impl TryFrom<&EndpointConfig> for Endpoint {
    type Error = EndpointError;

    fn try_from(config: &EndpointConfig) -> Result<Self, Self::Error> {
        Endpoint::new(&config.name, &config.base_url, &config.api_key)
    }
}

/// Ordered, non-empty, immutable list of endpoints.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<Endpoint>) -> EndpointResult<Self> {
        if endpoints.is_empty() {
            return Err(EndpointError::EmptyPool);
        }
        Ok(Self {
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
        })
    }

    /// Build the pool from configuration records, preserving their order.
    pub fn from_configs(configs: &[EndpointConfig]) -> EndpointResult<Self> {
        let endpoints = configs
            .iter()
            .map(Endpoint::try_from)
            .collect::<EndpointResult<Vec<_>>>()?;
        Self::new(endpoints)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false for a constructed pool.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Endpoint>> {
        self.endpoints.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.endpoints.iter()
    }
}

impl Index<usize> for EndpointPool {
    type Output = Arc<Endpoint>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.endpoints[index]
    }
}
