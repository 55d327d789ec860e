//! Application state for the web layer.

use std::sync::Arc;

use crate::resolver::RouteResolver;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Route resolver shared by every request
    pub resolver: Arc<RouteResolver>,
}

impl AppState {
    pub fn new(resolver: Arc<RouteResolver>) -> Self {
        Self { resolver }
    }
}
