//! Provider error types.
//!
//! Every failure a routing backend can produce is mapped onto one of these
//! variants at the client boundary. The resolver only ever matches on the
//! variant, never on message text.

use std::time::Duration;

use super::ProviderId;

/// Errors raised by a single routing provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Backend answered HTTP 429.
    #[error("rate limited by {provider}, retry after {}s", .retry_after.as_secs())]
    RateLimited {
        provider: ProviderId,
        retry_after: Duration,
    },

    /// Connection refused, DNS failure, or deadline exceeded.
    #[error("transport to {provider} failed or timed out")]
    TransportBlocked { provider: ProviderId },

    /// Backend answered but had no route between the points.
    #[error("{provider} found no route")]
    NoRouteFound { provider: ProviderId },

    /// Coordinates rejected before any request was made.
    #[error("invalid coordinates")]
    InvalidInput,

    /// Anything else: unexpected status, malformed body, client setup.
    #[error("{provider} failed: {cause}")]
    Unknown { provider: ProviderId, cause: String },
}

impl ProviderError {
    /// The provider that raised the error, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            ProviderError::RateLimited { provider, .. }
            | ProviderError::TransportBlocked { provider }
            | ProviderError::NoRouteFound { provider }
            | ProviderError::Unknown { provider, .. } => Some(*provider),
            ProviderError::InvalidInput => None,
        }
    }

    pub(crate) fn unknown(provider: ProviderId, cause: impl Into<String>) -> Self {
        ProviderError::Unknown {
            provider,
            cause: cause.into(),
        }
    }
}
