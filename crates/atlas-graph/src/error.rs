//! Errors scoped to the location graph.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("location {location_id} would form a self-loop; rejected by caller policy")]
    SelfLoop { location_id: String },

    #[error("location not found: {location_id}")]
    NotFound { location_id: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
