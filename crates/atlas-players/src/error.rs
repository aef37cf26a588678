//! Errors scoped to the player store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("player not found: {player_id}")]
    NotFound { player_id: String },

    #[error("external id already linked to a different player: {existing_player_id}")]
    Conflict { existing_player_id: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
