//! Redis-backed [`ExitHintDebouncer`] (C10, §4.10).
//!
//! Uses the same atomic `SET key 1 NX EX ttl` pattern as the session
//! nonce/lock helpers: the Redis server decides who was first, so no
//! read-then-write race exists between concurrent callers on different
//! partitions.

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::Pool as RedisPool;

use atlas_debounce::{DebounceError, DebounceResult, ExitHintDebouncer, ShouldEmitOutcome, TTL_MARGIN_SECONDS};
use atlas_types::{Direction, ExitHintDebounceRecord, LocationId, PlayerId};

const KEY_PREFIX: &str = "exithint:";

pub struct RedisExitHintDebouncer {
    pool: RedisPool,
}

impl RedisExitHintDebouncer {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExitHintDebouncer for RedisExitHintDebouncer {
    async fn should_emit(
        &self,
        player_id: PlayerId,
        origin_location_id: LocationId,
        direction: Direction,
        window_ms: u64,
    ) -> DebounceResult<ShouldEmitOutcome> {
        let mut conn = self.pool.get().await.map_err(|e| DebounceError::Storage {
            message: e.to_string(),
        })?;

        let key = format!(
            "{KEY_PREFIX}{}",
            ExitHintDebounceRecord::debounce_key(player_id, origin_location_id, direction)
        );
        let ttl_seconds = window_ms.div_ceil(1000) + TTL_MARGIN_SECONDS;

        let set: Option<String> = deadpool_redis::redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| DebounceError::Storage {
                message: e.to_string(),
            })?;

        if set.is_some() {
            return Ok(ShouldEmitOutcome {
                emit: true,
                debounce_hit: false,
            });
        }

        if window_ms == 0 {
            let _: () = conn.del(&key).await.map_err(|e| DebounceError::Storage {
                message: e.to_string(),
            })?;
            return Ok(ShouldEmitOutcome {
                emit: true,
                debounce_hit: false,
            });
        }

        Ok(ShouldEmitOutcome {
            emit: false,
            debounce_hit: true,
        })
    }
}
