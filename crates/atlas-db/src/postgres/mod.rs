//! Durable, Postgres/Redis-backed implementations of every subsystem
//! trait defined in `atlas-graph`, `atlas-clock`, `atlas-layers`,
//! `atlas-eventlog`, and `atlas-debounce`.

pub mod clock;
pub mod debounce;
pub mod eventlog;
pub mod layers;
pub mod location_graph;
pub mod players;

pub use clock::{PgLocationClock, PgWorldClock};
pub use debounce::RedisExitHintDebouncer;
pub use eventlog::PgWorldEventLog;
pub use layers::PgDescriptionLayerStore;
pub use location_graph::PgLocationGraph;
pub use players::PgPlayerStore;
