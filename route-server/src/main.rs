use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use route_server::resolver::{ResolverConfig, RouteResolver};
use route_server::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Read an environment variable and parse it, warning on bad values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}

fn config_from_env() -> ResolverConfig {
    let mut config = ResolverConfig::default();

    if let Ok(url) = std::env::var("OSRM_BASE_URL") {
        config = config.with_osrm_url(url);
    }
    if let Ok(url) = std::env::var("VALHALLA_BASE_URL") {
        config = config.with_valhalla_url(url);
    }
    // An empty path turns the persistent tier off.
    match std::env::var("ROUTE_CACHE_PATH") {
        Ok(path) if path.is_empty() => config = config.without_cache_path(),
        Ok(path) => config = config.with_cache_path(path),
        Err(_) => {}
    }
    if let Some(secs) = env_parse::<u64>("ROUTE_TIMEOUT_SECS") {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(rps) = env_parse::<f64>("ROUTE_REQUESTS_PER_SECOND") {
        config = config.with_requests_per_second(rps);
    }

    config
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config_from_env();
    let resolver = Arc::new(
        RouteResolver::from_config(&config).expect("Failed to create route resolver"),
    );

    // Sweep expired cache entries in the background
    let _sweeper = resolver
        .clone()
        .spawn_cache_cleanup(config.cache.cleanup_interval);

    let state = AppState::new(resolver);
    let app = create_router(state);

    let addr: SocketAddr = env_parse("ROUTE_SERVER_ADDR")
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
    info!(%addr, osrm = %config.osrm.base_url, valhalla = %config.valhalla.base_url, "route server listening");
    info!("endpoints: GET /health, GET /route, DELETE /cache, GET /stats");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
