//! Atlas Engine - the composition root for the Shifting Atlas world
//! engine (C8, C9, §9 Design Notes)
//!
//! Wires the pure-function crates (`atlas-core`) and the storage-backed
//! subsystem crates (`atlas-graph`, `atlas-clock`, `atlas-layers`,
//! `atlas-eventlog`, `atlas-debounce`, `atlas-telemetry`) into the two
//! operations the outer API layer calls — the move pipeline and the area
//! generation orchestrator — plus the scheduled jobs that run independent
//! of any request.

pub mod area_generation;
pub mod engine;
pub mod heading;
pub mod jobs;
pub mod move_pipeline;

pub use engine::WorldEngine;
pub use heading::{HeadingStore, InMemoryHeadingStore};
pub use move_pipeline::{MoveOutcome, MovePipelineDeps, MoveRequest};
