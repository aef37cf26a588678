//! Player bootstrap, lookup, and move DTOs (§6 `/api/player/*`).
//!
//! IDs and directions cross the HTTP boundary as `Uuid`/`String`, not the
//! domain newtypes - mirrors the reference DTO layer, which never derives
//! `ToSchema` on its own domain types either.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    pub player_guid: Uuid,
    pub created: bool,
    pub current_location_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GetPlayerQuery {
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPlayerResponse {
    pub id: Uuid,
    pub guest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveQuery {
    pub from: Option<Uuid>,
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub exits_summary: Option<String>,
    pub direction: String,
    pub from_location_id: Uuid,
}
