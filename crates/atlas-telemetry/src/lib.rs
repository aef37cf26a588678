//! Atlas Telemetry - correlation propagation and the telemetry envelope (C11, §4.11)
//!
//! [`event_name`] is the closed event-name registry; [`envelope`] is the
//! timing/emission wrapper generalized from the reference stack's
//! `timing_middleware`; [`cost`] is the hourly AI cost ledger.

pub mod cost;
pub mod envelope;
pub mod event_name;

pub use cost::{AiCostLedger, CostBucketTotals};
pub use envelope::{
    correlation_id_from_header, with_telemetry, EventSink, TelemetryEvent, TracingEventSink,
};
pub use event_name::EventName;
