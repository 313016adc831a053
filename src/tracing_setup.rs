use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Initialize logging from the `log` section of the configuration.
///
/// `RUST_LOG` wins over `level` when set. Fails if a global subscriber is
/// already installed or the level directive does not parse.
pub fn init_tracing(log: &LogConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .wrap_err_with(|| format!("Invalid log level: {}", log.level))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    if log.json {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.json().with_current_span(true).with_span_list(false))
            .try_init()
            .wrap_err("Failed to install JSON tracing subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.compact())
            .try_init()
            .wrap_err("Failed to install tracing subscriber")?;
    }

    tracing::debug!(level = %log.level, json = log.json, "Rotor logging initialized");
    Ok(())
}

/// Create the span wrapping one forwarded request.
pub fn create_request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "forward",
        http.method = method,
        http.path = path,
        endpoint = tracing::field::Empty,
        http.status_code = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let log = LogConfig {
            level: "rotor=verbose".to_string(),
            json: false,
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(init_tracing(&log).is_err());
        }
    }

    #[test]
    fn test_create_request_span() {
        let span = create_request_span("POST", "/v1beta/models");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "forward");
        }
    }
}
