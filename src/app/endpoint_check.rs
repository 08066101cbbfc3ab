// relayctl - app/endpoint_check.rs
//
// Reachability check for a webhook destination: one unauthenticated GET,
// timed, with the status and body size reported. Transport failures use
// the same `ApiError` kinds as the relay client.

use crate::app::api_client::{map_transport_error, ClientSettings};
use crate::util::constants;
use crate::util::error::ApiError;
use serde::Serialize;
use std::time::{Duration, Instant};

/// What one GET against an endpoint returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointReport {
    pub url: String,
    pub status: u16,
    pub elapsed_ms: u64,
    pub bytes: usize,
    /// Any status below 500. A 404 or 405 still proves something answers.
    pub reachable: bool,
}

/// Settings for a reachability check: the caller's user agent with the
/// shorter check timeout.
pub fn check_settings(base: &ClientSettings) -> ClientSettings {
    ClientSettings {
        timeout: Duration::from_secs(constants::ENDPOINT_CHECK_TIMEOUT_SECS),
        ..base.clone()
    }
}

/// GET `url` once and report how it answered.
///
/// Any HTTP status is a report, not an error. Only timeouts and
/// connection failures are returned as `Err`.
pub async fn check_endpoint(url: &str, settings: &ClientSettings) -> Result<EndpointReport, ApiError> {
    let http = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(&settings.user_agent)
        .build()
        .map_err(|e| ApiError::ConnectionFailed(format!("failed to build HTTP client: {e}")))?;

    let started = Instant::now();
    let response = http.get(url).send().await.map_err(map_transport_error)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(map_transport_error)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    tracing::debug!(url = %url, status, bytes = body.len(), elapsed_ms, "Endpoint answered");

    Ok(EndpointReport {
        url: url.to_string(),
        status,
        elapsed_ms,
        bytes: body.len(),
        reachable: status < constants::ENDPOINT_UNREACHABLE_STATUS,
    })
}
