//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use frontdesk_bridge::CallRegistry;
use frontdesk_config::Settings;
use frontdesk_persistence::PersistenceLayer;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Storage collaborators
    pub persistence: PersistenceLayer,
    /// Live call registry
    pub registry: CallRegistry,
}

impl AppState {
    /// Create new application state with in-memory stores
    pub fn new(config: Settings) -> Self {
        let max_calls = config.server.max_calls;
        Self {
            config: Arc::new(config),
            persistence: frontdesk_persistence::in_memory(),
            registry: CallRegistry::new(max_calls),
        }
    }

    /// Create application state with a caller-supplied persistence layer
    pub fn with_persistence(config: Settings, persistence: PersistenceLayer) -> Self {
        let max_calls = config.server.max_calls;
        Self {
            config: Arc::new(config),
            persistence,
            registry: CallRegistry::new(max_calls),
        }
    }
}
