//! Atlas Clock - the world clock and per-location clock anchors (C4, C5)
//!
//! The world clock is a single monotonically advancing counter; location
//! clocks are per-location anchors lazily pinned to it. Both use an ETag
//! for optimistic concurrency (no teacher crate models this directly; the
//! append-only advancement history follows the reference ledger's
//! append-only entry vector). Durable implementations live in `atlas-db`.

pub mod error;
pub mod location_clock;
pub mod memory;
pub mod world_clock;

pub use error::{ClockError, ClockResult};
pub use location_clock::{AnchorOutcome, LocationClock};
pub use memory::{InMemoryLocationClock, InMemoryWorldClock};
pub use world_clock::{AdvanceOutcome, WorldClock};
