//! Shared HTTP plumbing for the network providers.
//!
//! Status codes and transport failures are turned into [`ProviderError`]
//! variants here, so the provider clients and the resolver never inspect
//! error text.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;

use super::ProviderId;
use super::error::ProviderError;

/// Retry hint used when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Build a client with the provider's hard deadline.
pub(crate) fn build_client(
    provider: ProviderId,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("route-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::unknown(provider, format!("failed to build HTTP client: {e}")))
}

/// Map a response status onto the provider error taxonomy.
///
/// Success statuses map to `Ok(())`.
pub fn classify_status(
    provider: ProviderId,
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited {
            provider,
            retry_after: parse_retry_after(retry_after),
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NoRouteFound { provider });
    }

    if status == StatusCode::GATEWAY_TIMEOUT || status == StatusCode::BAD_GATEWAY {
        return Err(ProviderError::TransportBlocked { provider });
    }

    if !status.is_success() {
        return Err(ProviderError::unknown(provider, format!("HTTP {status}")));
    }

    Ok(())
}

/// Only the delta-seconds form is honoured; HTTP-date values fall back to
/// the default.
fn parse_retry_after(value: Option<&HeaderValue>) -> Duration {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Map a reqwest failure onto the taxonomy.
pub(crate) fn transport_error(provider: ProviderId, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::TransportBlocked { provider }
    } else {
        ProviderError::unknown(provider, err.to_string())
    }
}

/// Send a prepared request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    classify_status(provider, response.status(), response.headers().get(RETRY_AFTER))?;

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;

    serde_json::from_str(&body).map_err(|e| {
        let excerpt: String = body.chars().take(200).collect();
        ProviderError::unknown(provider, format!("invalid response body: {e} (body: {excerpt})"))
    })
}
