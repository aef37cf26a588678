//! Request handlers for all API endpoints, one module per resource.

pub mod health;
pub mod location;
pub mod player;
pub mod world;
