//! Prometheus metrics for the gateway.
//!
//! Installs the global recorder once at startup and exposes small helpers
//! so handlers never build metric names inline. The `/metrics` endpoint
//! renders the handle held in application state.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe every metric once.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(
        "carport_listing_requests_total",
        "Listing page requests, labelled by bucket"
    );
    describe_counter!(
        "carport_latest_requests_total",
        "Latest-snapshot requests, labelled by bucket"
    );
    describe_counter!(
        "carport_objects_served_total",
        "Objects streamed through the download proxy"
    );
    describe_counter!(
        "carport_bytes_served_total",
        "Body bytes scheduled for streaming through the download proxy"
    );
    describe_counter!(
        "carport_store_list_pages_total",
        "Cursor pages fetched from object storage during enumeration"
    );

    Ok(handle)
}

/// Count one listing page request against a bucket.
pub fn record_listing_request(bucket: &str) {
    counter!("carport_listing_requests_total", "bucket" => bucket.to_string()).increment(1);
}

/// Count one latest-snapshot request against a bucket.
pub fn record_latest_request(bucket: &str) {
    counter!("carport_latest_requests_total", "bucket" => bucket.to_string()).increment(1);
}

/// Count one object download plus the bytes its body will carry.
pub fn record_object_served(bytes: u64) {
    counter!("carport_objects_served_total").increment(1);
    counter!("carport_bytes_served_total").increment(bytes);
}
