//! Atlas DB - durable persistence for the Shifting Atlas world engine
//!
//! PostgreSQL is the system of record for locations, clocks, description
//! layers, and the world event log; Redis backs the exit-hint debouncer,
//! which only ever needs a short-lived TTL key rather than durable
//! storage. Every trait defined in `atlas-graph`, `atlas-clock`,
//! `atlas-layers`, `atlas-eventlog`, and `atlas-debounce` has a
//! Postgres/Redis implementation here alongside the in-memory one each
//! crate ships for tests.
//!
//! # Repository Pattern
//!
//! Each subsystem gets its own repository struct wrapping a cloned
//! `PgPool`/`RedisPool`; invariants (canonical exit order, etag rotation,
//! monotonic event status) are enforced in Rust under a `FOR UPDATE` row
//! lock rather than pushed into SQL constraints, mirroring how the
//! in-memory stores enforce them under an `RwLock` write guard.

pub mod config;
pub mod error;
pub mod postgres;

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use postgres::*;

/// Database connection pools: PostgreSQL for durable state, Redis for the
/// exit-hint debouncer.
pub struct Database {
    pub pg: PgPool,
    pub redis: RedisPool,
}

impl Database {
    /// Connect to PostgreSQL and Redis, verifying both are reachable.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.pg_acquire_timeout_secs,
            ))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {e}")))?;

        info!("Connected to PostgreSQL");

        info!("Connecting to Redis: {}", config.redis_url_masked());

        let redis_cfg = RedisConfig::from_url(&config.redis_url);
        let redis = redis_cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DbError::Connection(format!("Redis: {e}")))?;

        let mut conn = redis
            .get()
            .await
            .map_err(|e| DbError::Connection(format!("Redis pool: {e}")))?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| DbError::Connection(format!("Redis ping: {e}")))?;

        info!("Connected to Redis");

        Ok(Self { pg, redis })
    }

    /// Runs the SQL migrations embedded at compile time.
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check for both backing stores.
    pub async fn health_check(&self) -> DbResult<HealthStatus> {
        let pg_ok = sqlx::query("SELECT 1").fetch_one(&self.pg).await.is_ok();

        let redis_ok = async {
            let mut conn = self.redis.get().await.ok()?;
            let result: Result<String, _> = deadpool_redis::redis::cmd("PING")
                .query_async(&mut *conn)
                .await;
            result.ok()
        }
        .await
        .is_some();

        Ok(HealthStatus {
            postgres: pg_ok,
            redis: redis_ok,
            healthy: pg_ok && redis_ok,
        })
    }

    pub fn location_graph(&self) -> PgLocationGraph {
        PgLocationGraph::new(self.pg.clone())
    }

    pub fn world_clock(&self) -> PgWorldClock {
        PgWorldClock::new(self.pg.clone())
    }

    pub fn location_clock(&self) -> PgLocationClock {
        PgLocationClock::new(self.pg.clone())
    }

    pub fn description_layers(&self) -> PgDescriptionLayerStore {
        PgDescriptionLayerStore::new(self.pg.clone())
    }

    pub fn event_log(&self) -> PgWorldEventLog {
        PgWorldEventLog::new(self.pg.clone())
    }

    pub fn exit_hint_debouncer(&self) -> RedisExitHintDebouncer {
        RedisExitHintDebouncer::new(self.redis.clone())
    }

    pub fn players(&self) -> PgPlayerStore {
        PgPlayerStore::new(self.pg.clone())
    }
}

/// Health status of both backing stores.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub postgres: bool,
    pub redis: bool,
    pub healthy: bool,
}
