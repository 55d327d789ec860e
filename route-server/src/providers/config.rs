//! Configuration for the HTTP routing providers.

use std::time::Duration;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Public OSRM and Valhalla instances allow about one request per second.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;

/// Default base URL for the OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Default base URL for the public Valhalla instance.
pub const DEFAULT_VALHALLA_URL: &str = "https://valhalla1.openstreetmap.de";

/// Configuration for one HTTP routing backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Hard deadline for a single request.
    pub timeout: Duration,
    /// Outbound request budget for this backend.
    pub requests_per_second: f64,
}

impl ProviderConfig {
    /// Create a config for the given base URL with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    /// Default config for the OSRM backend.
    pub fn osrm() -> Self {
        Self::new(DEFAULT_OSRM_URL)
    }

    /// Default config for the Valhalla backend.
    pub fn valhalla() -> Self {
        Self::new(DEFAULT_VALHALLA_URL)
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the request budget.
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }
}
