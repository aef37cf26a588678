//! `From` impls converting each subsystem's narrow error enum into
//! [`EngineError`]. Kept here (rather than in each subsystem crate, or in
//! `atlas-engine`) because Rust's orphan rule requires the impl to live in
//! the crate owning one of the two types, and `EngineError` is the type
//! every subsystem converges on.

use atlas_clock::ClockError;
use atlas_debounce::DebounceError;
use atlas_eventlog::EventLogError;
use atlas_graph::GraphError;
use atlas_layers::LayersError;
use atlas_players::PlayerError;

use crate::error::EngineError;

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Storage { message } => EngineError::Internal { message },
            GraphError::SelfLoop { location_id } => EngineError::Validation {
                message: format!("location {location_id} would form a self-loop"),
            },
            GraphError::NotFound { location_id } => EngineError::LocationNotFound { location_id },
        }
    }
}

impl From<ClockError> for EngineError {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::ConcurrentAdvancement => EngineError::ConcurrentAdvancement,
            ClockError::AlreadyInitialized => EngineError::Validation {
                message: "world clock is already initialized".to_string(),
            },
            ClockError::Uninitialized => EngineError::Internal {
                message: "world clock has not been initialized".to_string(),
            },
            ClockError::InvalidDuration => EngineError::Validation {
                message: "durationMs must be greater than zero".to_string(),
            },
            ClockError::Storage { message } => EngineError::Internal { message },
        }
    }
}

impl From<LayersError> for EngineError {
    fn from(err: LayersError) -> Self {
        match err {
            LayersError::NotFound { layer_id } => EngineError::Internal {
                message: format!("description layer not found: {layer_id}"),
            },
            LayersError::Storage { message } => EngineError::Internal { message },
        }
    }
}

impl From<EventLogError> for EngineError {
    fn from(err: EventLogError) -> Self {
        match err {
            EventLogError::NotFound { event_id } => EngineError::Internal {
                message: format!("world event not found: {event_id}"),
            },
            EventLogError::IllegalTransition { from, to } => EngineError::Internal {
                message: format!("illegal event status transition: {from:?} -> {to:?}"),
            },
            EventLogError::DuplicateIdempotencyKey { idempotency_key } => EngineError::Internal {
                message: format!("idempotency key already claimed: {idempotency_key}"),
            },
            EventLogError::Storage { message } => EngineError::Internal { message },
        }
    }
}

impl From<DebounceError> for EngineError {
    fn from(err: DebounceError) -> Self {
        match err {
            DebounceError::Storage { message } => EngineError::Internal { message },
        }
    }
}

impl From<PlayerError> for EngineError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::NotFound { player_id } => EngineError::PlayerNotFound { player_id },
            PlayerError::Conflict { existing_player_id } => {
                EngineError::Conflict { existing_player_id }
            }
            PlayerError::Storage { message } => EngineError::Internal { message },
        }
    }
}
