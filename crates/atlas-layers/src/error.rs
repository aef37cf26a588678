//! Errors scoped to the description layer store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayersError {
    #[error("description layer not found: {layer_id}")]
    NotFound { layer_id: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type LayersResult<T> = std::result::Result<T, LayersError>;
