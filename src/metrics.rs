//! Lightweight metrics helpers for Rotor.
//!
//! Thin wrappers around the `metrics` crate macros. No exporter is bundled;
//! an embedding application can install any compatible recorder, otherwise
//! the calls are no-ops.
//!
//! Provided metrics:
//! * `rotor_endpoint_selections_total` (counter, label `endpoint`)
//! * `rotor_upstream_requests_total` (counter, labels `endpoint`, `status`)
//! * `rotor_upstream_request_duration_seconds` (histogram, label `endpoint`)
use std::time::Duration;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const ROTOR_ENDPOINT_SELECTIONS_TOTAL: &str = "rotor_endpoint_selections_total";
pub const ROTOR_UPSTREAM_REQUESTS_TOTAL: &str = "rotor_upstream_requests_total";
pub const ROTOR_UPSTREAM_REQUEST_DURATION_SECONDS: &str = "rotor_upstream_request_duration_seconds";

static DESCRIPTIONS: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        ROTOR_ENDPOINT_SELECTIONS_TOTAL,
        Unit::Count,
        "Number of times each endpoint was picked by the round-robin selector."
    );
    describe_counter!(
        ROTOR_UPSTREAM_REQUESTS_TOTAL,
        Unit::Count,
        "Upstream exchanges by endpoint and relayed status (502 for transport failures)."
    );
    describe_histogram!(
        ROTOR_UPSTREAM_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of upstream exchanges, including reading the full body."
    );
});

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    Lazy::force(&DESCRIPTIONS);
}

pub fn increment_endpoint_selection(endpoint: &str) {
    counter!(ROTOR_ENDPOINT_SELECTIONS_TOTAL, "endpoint" => endpoint.to_string()).increment(1);
}

/// Record one finished upstream exchange.
pub fn record_upstream_request(endpoint: &str, status: u16, duration: Duration) {
    counter!(
        ROTOR_UPSTREAM_REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        ROTOR_UPSTREAM_REQUEST_DURATION_SECONDS,
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64());
}
