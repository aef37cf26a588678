//! Errors scoped to the world event log.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("world event not found: {event_id}")]
    NotFound { event_id: String },

    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: atlas_types::EventStatus,
        to: atlas_types::EventStatus,
    },

    #[error("idempotency key already claimed by a different event: {idempotency_key}")]
    DuplicateIdempotencyKey { idempotency_key: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type EventLogResult<T> = std::result::Result<T, EventLogError>;
