use std::net::SocketAddr;

use http::HeaderValue;

use crate::config::models::{EndpointConfig, ProxyConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Proxy configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire configuration, reporting every problem at once
    pub fn validate(config: &ProxyConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.api_configs.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "api_configs".to_string(),
            });
        } else {
            for (i, endpoint) in config.api_configs.iter().enumerate() {
                errors.extend(Self::validate_endpoint(i, endpoint));
            }
        }

        if config.upstream_timeout_secs == Some(0) {
            errors.push(ValidationError::InvalidField {
                field: "upstream_timeout_secs".to_string(),
                message: "Timeout must be greater than zero; omit it to disable".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:8888' or '0.0.0.0:8888')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_endpoint(index: usize, endpoint: &EndpointConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let context = format!("api_configs[{index}] ('{}')", endpoint.name);

        if let Err(e) = Self::validate_url(&endpoint.base_url, &format!("{context} base_url")) {
            errors.push(e);
        }

        if endpoint.api_key.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("{context} api_key"),
            });
        } else if HeaderValue::from_str(&endpoint.api_key).is_err() {
            errors.push(ValidationError::InvalidField {
                field: format!("{context} api_key"),
                message: "API key contains characters that cannot be sent in a header"
                    .to_string(),
            });
        }

        errors
    }

    /// Validate URL format
    fn validate_url(url_str: &str, context: &str) -> ValidationResult<()> {
        match url::Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: format!(
                            "URL scheme must be 'http' or 'https', got '{}'",
                            url.scheme()
                        ),
                    });
                }

                if url.host().is_none() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "URL must have a valid host".to_string(),
                    });
                }

                Ok(())
            }
            Err(e) => Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("Invalid URL format: {e}"),
            }),
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
