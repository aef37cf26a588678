//! Atlas Core - canonical direction resolution and exit availability
//! modeling for the Shifting Atlas world engine
//!
//! This crate implements the two pure-function components of the world
//! engine (C1, C2) plus the shared [`EngineError`] enum every other
//! subsystem crate ultimately converts into:
//! - Direction Normalizer: maps raw player input to a canonical direction
//! - Exit Availability Model: classifies a direction's availability at a
//!   location as hard, pending, or forbidden
//!
//! Neither component touches I/O; both are deterministic given their
//! inputs, which is what makes them safe to unit test exhaustively.
//!
//! [`conversions`] additionally carries the `From` impls that fold every
//! subsystem crate's narrow error enum into [`EngineError`] — it lives
//! here rather than upstream because the orphan rule requires the impl
//! to sit beside one of the two types involved.

pub mod conversions;
pub mod direction;
pub mod exits;
pub mod error;

pub use direction::*;
pub use exits::*;
pub use error::*;
