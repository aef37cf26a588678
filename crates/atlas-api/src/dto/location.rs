//! Location lookup DTOs (§6 `/api/location`, `/api/location/look`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationQuery {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitInfoDto {
    pub direction: String,
    pub availability: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub version: u64,
    pub exits_summary: Option<String>,
    pub exits: Vec<ExitInfoDto>,
}
