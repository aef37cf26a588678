//! Atlas Server
//!
//! Service binary for the Shifting Atlas world engine: wires the
//! composition root (`atlas_engine::WorldEngine`), mounts the HTTP surface
//! (`atlas_api::create_router`), and runs the background world-clock and
//! description-layer integrity jobs on a fixed interval.
//!
//! # Usage
//!
//! ```bash
//! atlas-server
//! atlas-server --config /path/to/config.toml
//! ATLAS__SERVER__PORT=9000 atlas-server
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use atlas_api::state::AppState;
use atlas_debounce::{ExitHintDebouncer, InMemoryExitHintDebouncer};
use atlas_engine::WorldEngine;
use atlas_eventlog::{InMemoryWorldEventLog, WorldEventLog};
use atlas_graph::{memory::InMemoryLocationGraph, LocationGraph};
use atlas_layers::{DescriptionLayerStore, InMemoryDescriptionLayerStore};
use atlas_players::{InMemoryPlayerStore, PlayerStore};
use atlas_telemetry::TracingEventSink;
use atlas_types::{Location, LocationId};

use crate::config::{PersistenceMode, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "atlas-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML, JSON, or YAML).
    #[arg(short, long, env = "ATLAS_CONFIG")]
    config: Option<String>,

    /// Host to bind to, overriding configuration.
    #[arg(long, env = "ATLAS_HOST")]
    host: Option<String>,

    /// Port to listen on, overriding configuration.
    #[arg(short, long, env = "ATLAS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting atlas-server");

    if server_config.metrics.enabled {
        start_metrics_server(server_config.metrics.port)?;
    }

    let event_sink: Arc<dyn atlas_telemetry::EventSink> = Arc::new(TracingEventSink {
        service: "atlas-server".to_string(),
    });

    let starter_location_id = LocationId::new();
    let engine = match server_config.persistence.mode {
        PersistenceMode::Memory => {
            build_memory_engine(starter_location_id, event_sink.clone(), &server_config).await?
        }
        PersistenceMode::Durable => {
            build_durable_engine(starter_location_id, event_sink.clone(), &server_config).await?
        }
    };
    let engine = Arc::new(engine);

    spawn_scheduler(event_sink, &server_config).await;

    let state = Arc::new(AppState::new(engine, "atlas-server"));
    let app = atlas_api::create_router(state);

    let addr = server_config.server.socket_addr();
    tracing::info!(host = %server_config.server.host, port = server_config.server.port, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Wires every collaborator against the in-memory backends and seeds a
/// single starter location, since nothing durable exists yet to hold one.
async fn build_memory_engine(
    starter_location_id: LocationId,
    event_sink: Arc<dyn atlas_telemetry::EventSink>,
    server_config: &ServerConfig,
) -> anyhow::Result<WorldEngine> {
    let graph = Arc::new(InMemoryLocationGraph::new());
    graph
        .upsert(Location::new(
            starter_location_id,
            "The Atrium",
            "A circular hall where every journey into the world begins.",
        ))
        .await?;

    let engine = WorldEngine::new(
        graph,
        Arc::new(InMemoryWorldEventLog::new()),
        Arc::new(InMemoryExitHintDebouncer::new()),
        Arc::new(atlas_engine::InMemoryHeadingStore::new()),
        Arc::new(InMemoryPlayerStore::new()),
        event_sink,
        starter_location_id,
    )
    .with_max_budget_locations(server_config.world.max_budget_locations)
    .with_debounce_window_ms(server_config.world.exit_hint_debounce_ms);

    Ok(engine)
}

/// Wires every collaborator against the durable (PostgreSQL/Redis)
/// backends. The starter location is expected to already exist (seeded by
/// the durable backend's own migrations/tooling), since a boot-time upsert
/// against a shared database would race every other running instance.
async fn build_durable_engine(
    starter_location_id: LocationId,
    event_sink: Arc<dyn atlas_telemetry::EventSink>,
    server_config: &ServerConfig,
) -> anyhow::Result<WorldEngine> {
    let db = atlas_db::Database::connect(&server_config.persistence.database).await?;
    let health = db.health_check().await?;
    if !health.healthy {
        anyhow::bail!("durable backend health check failed: {health:?}");
    }
    tracing::info!("connected to durable backend");

    let graph: Arc<dyn LocationGraph> = Arc::new(db.location_graph());
    let event_log: Arc<dyn WorldEventLog> = Arc::new(db.event_log());
    let debouncer: Arc<dyn ExitHintDebouncer> = Arc::new(db.exit_hint_debouncer());
    let players: Arc<dyn PlayerStore> = Arc::new(db.players());

    let engine = WorldEngine::new(
        graph,
        event_log,
        debouncer,
        Arc::new(atlas_engine::InMemoryHeadingStore::new()),
        players,
        event_sink,
        starter_location_id,
    )
    .with_max_budget_locations(server_config.world.max_budget_locations)
    .with_debounce_window_ms(server_config.world.exit_hint_debounce_ms);

    Ok(engine)
}

/// Registers the world-clock-advance and description-layer-integrity jobs
/// against their own `tokio::time::interval`s (§9 Design Notes, "Scheduled
/// jobs"). Each loop owns its collaborator independently of `WorldEngine`,
/// since neither job runs through the move/generation pipelines.
async fn spawn_scheduler(
    event_sink: Arc<dyn atlas_telemetry::EventSink>,
    server_config: &ServerConfig,
) {
    let world_clock: Arc<dyn atlas_clock::WorldClock> = Arc::new(atlas_clock::InMemoryWorldClock::new());
    let location_clock: Arc<dyn atlas_clock::LocationClock> =
        Arc::new(atlas_clock::InMemoryLocationClock::new());
    let layers: Arc<dyn DescriptionLayerStore> = Arc::new(InMemoryDescriptionLayerStore::new());

    if let Err(err) = world_clock.initialize(0).await {
        tracing::warn!(error = %err, "world clock initialize failed; advance job will wait for the next scheduler tick");
    }

    let tick_duration_ms = server_config.world.world_clock_tick_duration_ms;
    let tick_interval = Duration::from_secs(server_config.world.world_clock_tick_interval_secs);
    let clock_sink = event_sink.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            atlas_engine::jobs::advance_world_clock_job(
                clock_sink.as_ref(),
                world_clock.as_ref(),
                location_clock.as_ref(),
                tick_duration_ms,
            )
            .await;
        }
    });

    let batch_size = server_config.world.integrity_job_batch_size;
    let integrity_interval = Duration::from_secs(server_config.world.integrity_job_interval_secs);
    let integrity_sink = event_sink;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(integrity_interval);
        loop {
            interval.tick().await;
            atlas_engine::jobs::integrity_job(integrity_sink.as_ref(), layers.as_ref(), batch_size).await;
        }
    });
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }

    Ok(())
}

fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(port = port, "starting metrics server");

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?;

    tokio::spawn(async move {
        let _handle = handle;
        std::future::pending::<()>().await;
    });

    Ok(())
}

async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "waiting for in-flight requests to complete");
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_port_override() {
        let args = Args::parse_from(["atlas-server", "--port", "9001"]);
        assert_eq!(args.port, Some(9001));
    }
}
