//! Shared gateway state.

use std::sync::Arc;

use parley_engine::{EngineConfig, MatchEngine};

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
pub struct GatewayState {
    /// The matchmaking engine; owns all queue/directory/registry state.
    pub engine: MatchEngine,
    /// Server version string.
    pub version: String,
}

impl GatewayState {
    pub fn new(engine_config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            engine: MatchEngine::new(engine_config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}
