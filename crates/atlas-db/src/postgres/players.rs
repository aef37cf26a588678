//! PostgreSQL-backed [`PlayerStore`] (§3 Player).
//!
//! `bootstrap` and `link_external_id` both need a check-then-write
//! against a uniqueness constraint (the id for bootstrap's existence
//! check, `external_id` for linking), so both run inside a transaction
//! with `FOR UPDATE` on the candidate row, the same shape the other
//! repositories in this crate use for their own invariants.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use atlas_players::{BootstrapOutcome, PlayerError, PlayerResult, PlayerStore};
use atlas_types::{LinkOutcome, LocationId, Player, PlayerId};

pub struct PgPlayerStore {
    pool: PgPool,
}

impl PgPlayerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> PlayerResult<Player> {
        let id_str: String = row.get("id");
        let id = PlayerId::parse(&id_str).map_err(|_| PlayerError::Storage {
            message: format!("corrupt player id in storage: {id_str}"),
        })?;
        let location_str: String = row.get("current_location_id");
        let current_location_id =
            LocationId::parse(&location_str).map_err(|_| PlayerError::Storage {
                message: format!("corrupt location id in storage: {location_str}"),
            })?;
        let heading_str: Option<String> = row.get("heading");
        let heading = heading_str
            .map(|s| {
                serde_json::from_value(serde_json::Value::String(s.clone())).map_err(|_| {
                    PlayerError::Storage {
                        message: format!("corrupt heading in storage: {s}"),
                    }
                })
            })
            .transpose()?;

        Ok(Player {
            id,
            created_utc: row.get("created_utc"),
            updated_utc: row.get("updated_utc"),
            guest: row.get("guest"),
            external_id: row.get("external_id"),
            current_location_id,
            name: row.get("name"),
            clock_tick: row.get("clock_tick"),
            attributes: row.get("attributes"),
            inventory_version: row.get::<Option<i64>, _>("inventory_version").map(|v| v as u64),
            heading,
        })
    }

    async fn insert(&self, player: &Player) -> PlayerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO players
                (id, created_utc, updated_utc, guest, external_id, current_location_id, name,
                 clock_tick, attributes, inventory_version, heading)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(player.id.to_string())
        .bind(player.created_utc)
        .bind(player.updated_utc)
        .bind(player.guest)
        .bind(&player.external_id)
        .bind(player.current_location_id.to_string())
        .bind(&player.name)
        .bind(player.clock_tick)
        .bind(&player.attributes)
        .bind(player.inventory_version.map(|v| v as i64))
        .bind(player.heading.map(|h| h.as_str().to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| PlayerError::Storage {
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[async_trait]
impl PlayerStore for PgPlayerStore {
    async fn bootstrap(
        &self,
        requested_id: Option<PlayerId>,
        starter_location_id: LocationId,
    ) -> PlayerResult<BootstrapOutcome> {
        if let Some(id) = requested_id {
            let row = sqlx::query("SELECT * FROM players WHERE id = $1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PlayerError::Storage {
                    message: e.to_string(),
                })?;
            if let Some(row) = row {
                return Ok(BootstrapOutcome {
                    player: Self::decode(&row)?,
                    created: false,
                });
            }
        }

        let player = Player::new_guest(starter_location_id, Utc::now());
        self.insert(&player).await?;
        Ok(BootstrapOutcome {
            player,
            created: true,
        })
    }

    async fn get(&self, id: PlayerId) -> PlayerResult<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PlayerError::Storage {
                message: e.to_string(),
            })?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn get_by_external_id(&self, external_id: &str) -> PlayerResult<Option<Player>> {
        let normalized = external_id.to_lowercase();
        let row = sqlx::query("SELECT * FROM players WHERE external_id = $1")
            .bind(&normalized)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PlayerError::Storage {
                message: e.to_string(),
            })?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn update_location(
        &self,
        id: PlayerId,
        new_location_id: LocationId,
    ) -> PlayerResult<Player> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE players SET current_location_id = $1, updated_utc = $2 WHERE id = $3",
        )
        .bind(new_location_id.to_string())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| PlayerError::Storage {
            message: e.to_string(),
        })?;
        if result.rows_affected() == 0 {
            return Err(PlayerError::NotFound {
                player_id: id.to_string(),
            });
        }
        self.get(id).await?.ok_or_else(|| PlayerError::NotFound {
            player_id: id.to_string(),
        })
    }

    async fn link_external_id(
        &self,
        id: PlayerId,
        external_id: &str,
    ) -> PlayerResult<(Player, LinkOutcome)> {
        let normalized = external_id.to_lowercase();
        let mut tx = self.pool.begin().await.map_err(|e| PlayerError::Storage {
            message: e.to_string(),
        })?;

        let owner_row = sqlx::query("SELECT id FROM players WHERE external_id = $1 FOR UPDATE")
            .bind(&normalized)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| PlayerError::Storage {
                message: e.to_string(),
            })?;
        if let Some(owner_row) = owner_row {
            let owner_id: String = owner_row.get("id");
            if owner_id != id.to_string() {
                return Err(PlayerError::Conflict {
                    existing_player_id: owner_id,
                });
            }
            let row = sqlx::query("SELECT * FROM players WHERE id = $1")
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| PlayerError::Storage {
                    message: e.to_string(),
                })?;
            return Ok((Self::decode(&row)?, LinkOutcome::NoOp));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE players SET external_id = $1, guest = FALSE, updated_utc = $2 WHERE id = $3",
        )
        .bind(&normalized)
        .bind(now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| PlayerError::Storage {
            message: e.to_string(),
        })?;
        if result.rows_affected() == 0 {
            return Err(PlayerError::NotFound {
                player_id: id.to_string(),
            });
        }

        let row = sqlx::query("SELECT * FROM players WHERE id = $1")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| PlayerError::Storage {
                message: e.to_string(),
            })?;
        tx.commit().await.map_err(|e| PlayerError::Storage {
            message: e.to_string(),
        })?;

        Ok((Self::decode(&row)?, LinkOutcome::Linked))
    }
}
