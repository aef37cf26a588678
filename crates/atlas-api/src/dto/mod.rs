//! Data Transfer Objects
//!
//! Request and response structures for the HTTP surface. Boundary
//! structs only - every field is a primitive or `Uuid`/`String`, never a
//! domain newtype, so the engine's shapes can change without touching the
//! wire contract (§9 Design Notes: "dynamic any at boundaries" becomes
//! parsed-then-validated structs here).

pub mod common;
pub mod location;
pub mod player;
pub mod world;

pub use common::*;
pub use location::*;
pub use player::*;
pub use world::*;
