//! Errors scoped to the world clock and location clocks.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("world clock is already initialized")]
    AlreadyInitialized,

    #[error("world clock has not been initialized")]
    Uninitialized,

    #[error("durationMs must be greater than zero")]
    InvalidDuration,

    #[error("concurrent advancement: etag no longer matches, re-read and retry")]
    ConcurrentAdvancement,

    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;
