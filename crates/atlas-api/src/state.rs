//! Application state shared across handlers.

use std::sync::Arc;

use atlas_engine::WorldEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorldEngine>,
    pub service_name: String,
}

impl AppState {
    pub fn new(engine: Arc<WorldEngine>, service_name: impl Into<String>) -> Self {
        Self {
            engine,
            service_name: service_name.into(),
        }
    }
}
