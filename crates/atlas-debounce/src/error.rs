//! Errors scoped to the exit-hint debouncer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebounceError {
    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type DebounceResult<T> = std::result::Result<T, DebounceError>;
