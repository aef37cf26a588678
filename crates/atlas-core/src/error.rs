//! The engine-wide error type (§7 Error handling design).
//!
//! Every subsystem crate (`atlas-graph`, `atlas-clock`, `atlas-layers`,
//! `atlas-eventlog`, `atlas-debounce`) defines its own narrow error enum
//! scoped to that subsystem's own failure modes, then converts into this
//! enum at the point where `atlas-engine` calls it. `atlas-api` is the only
//! crate that matches on `EngineError` to pick an HTTP status; nothing
//! above that boundary should need to know which subsystem a failure
//! originated in.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("ambiguous direction: {clarification}")]
    AmbiguousDirection { clarification: String },

    #[error("no exit in direction {direction} from {from_location}")]
    NoExit {
        from_location: String,
        direction: String,
    },

    #[error("location not found: {location_id}")]
    FromMissing { location_id: String },

    #[error("move target location not found: {location_id}")]
    TargetMissing { location_id: String },

    #[error("location not found: {location_id}")]
    LocationNotFound { location_id: String },

    #[error("player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("external id already linked to a different player: {existing_player_id}")]
    Conflict { existing_player_id: String },

    #[error("world clock was advanced concurrently; retry with a fresh read")]
    ConcurrentAdvancement,

    #[error("no hard exit for {direction} from {from_location}; expansion suggested")]
    Generate {
        from_location: String,
        direction: String,
        origin_location_id: String,
    },

    #[error("downstream call exceeded its deadline")]
    Timeout,

    #[error("operation is formally deferred and not implemented")]
    NotImplemented,

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// The stable error code surfaced over HTTP and in telemetry; kept
    /// distinct from the `Display` message so clients can match on it
    /// without parsing prose.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "ValidationError",
            EngineError::AmbiguousDirection { .. } => "AmbiguousDirection",
            EngineError::NoExit { .. } => "NoExit",
            EngineError::FromMissing { .. } => "FromMissing",
            EngineError::TargetMissing { .. } => "TargetMissing",
            EngineError::LocationNotFound { .. } => "LocationNotFound",
            EngineError::PlayerNotFound { .. } => "PlayerNotFound",
            EngineError::Conflict { .. } => "Conflict",
            EngineError::ConcurrentAdvancement => "ConcurrentAdvancement",
            EngineError::Generate { .. } => "Generate",
            EngineError::Timeout => "Timeout",
            EngineError::NotImplemented => "NotImplemented",
            EngineError::Internal { .. } => "Internal",
        }
    }
}
