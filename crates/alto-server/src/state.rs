//! Shared server state

use std::sync::Arc;

use alto_core::TopologyStore;

use crate::config::{ServerConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_CONCURRENT_REQUESTS};

/// Read-only state handed to every request
#[derive(Debug)]
pub struct ServerState {
    pub store: TopologyStore,
    pub max_body_bytes: usize,
    pub max_concurrent_requests: usize,
}

impl ServerState {
    pub fn new(store: TopologyStore) -> Self {
        Self {
            store,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Take request limits from `config`
    pub fn with_limits(mut self, config: &ServerConfig) -> Self {
        self.max_body_bytes = config.max_body_bytes;
        self.max_concurrent_requests = config.max_concurrent_requests.max(1);
        self
    }
}

pub type SharedState = Arc<ServerState>;

pub fn create_shared_state(store: TopologyStore) -> SharedState {
    Arc::new(ServerState::new(store))
}
