//! Atlas Types - canonical data types for the Shifting Atlas world engine
//!
//! This crate holds the pure data contracts shared by every subsystem:
//! locations and exits, players, the world/location clocks, description
//! layers, world event records, and the transient area-generation request
//! shape. Nothing in this crate performs I/O; it exists so that
//! `atlas-graph`, `atlas-clock`, `atlas-layers`, `atlas-eventlog`,
//! `atlas-debounce`, and `atlas-engine` can all speak the same vocabulary
//! without depending on each other.

pub mod ids;
pub mod direction;
pub mod location;
pub mod player;
pub mod clock;
pub mod layers;
pub mod events;
pub mod debounce;
pub mod area_gen;

pub use ids::*;
pub use direction::*;
pub use location::*;
pub use player::*;
pub use clock::*;
pub use layers::*;
pub use events::*;
pub use debounce::*;
pub use area_gen::*;
