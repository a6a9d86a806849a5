//! Application state.

use paperkg_core::GraphService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: GraphService,
    /// Expose internal error messages in 500 responses.
    pub debug: bool,
}

impl AppState {
    pub fn new(service: GraphService, debug: bool) -> Self {
        Self { service, debug }
    }
}
