//! World generation and room-linking DTOs (§6 `/api/world/*`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAreaRequest {
    pub anchor_location_id: Option<Uuid>,
    /// One of `urban`, `wilderness`, `auto`.
    pub mode: String,
    pub budget_locations: i64,
    pub realm_hints: Option<Vec<String>>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAreaResponse {
    pub enqueued_count: u32,
    pub anchor_location_id: Uuid,
    pub terrain: String,
    pub idempotency_key: String,
    pub clamped: bool,
    pub max_budget: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRoomsRequest {
    pub origin_id: Uuid,
    pub dest_id: Uuid,
    /// A canonical direction token (§6 Direction tokens).
    pub dir: String,
    #[serde(default)]
    pub reciprocal: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRoomsResponse {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reciprocal_created: Option<bool>,
}
