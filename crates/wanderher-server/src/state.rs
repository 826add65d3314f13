use std::sync::Arc;

use wanderher_core::ChatProvider;

/// Shared by every request; holds no per-conversation data.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}
