//! API error handling (§7 Error handling design, §10.1 Ambient stack).
//!
//! `ApiError` wraps [`EngineError`] and is the single place `EngineError`
//! variants are mapped to HTTP status codes - nothing above this
//! boundary should match on `EngineError` directly.

use atlas_core::error::EngineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::dto::common::Envelope;

#[derive(Debug)]
pub struct ApiError {
    pub engine_error: EngineError,
    pub correlation_id: String,
}

impl ApiError {
    pub fn new(engine_error: EngineError, correlation_id: impl Into<String>) -> Self {
        Self {
            engine_error,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.engine_error {
            EngineError::Validation { .. }
            | EngineError::AmbiguousDirection { .. }
            | EngineError::NoExit { .. }
            | EngineError::Generate { .. } => StatusCode::BAD_REQUEST,
            EngineError::FromMissing { .. }
            | EngineError::TargetMissing { .. }
            | EngineError::LocationNotFound { .. }
            | EngineError::PlayerNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Conflict { .. } | EngineError::ConcurrentAdvancement => {
                StatusCode::CONFLICT
            }
            EngineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            EngineError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            EngineError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The error envelope `ApiError` serializes to. A `Generate` error carries
/// an extra `generationHint` sibling to `error` - a non-fatal "please
/// expand" signal (§7), not a second error shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationHintBody {
    origin_location_id: String,
    direction: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.engine_error.code().to_string();
        let message = self.engine_error.to_string();

        if let EngineError::Generate {
            from_location,
            direction,
            ..
        } = &self.engine_error
        {
            let mut body = serde_json::to_value(Envelope::<()>::err(
                code,
                message,
                self.correlation_id.clone(),
            ))
            .unwrap_or_else(|_| serde_json::json!({}));
            if let Some(map) = body.as_object_mut() {
                map.insert(
                    "generationHint".to_string(),
                    serde_json::to_value(GenerationHintBody {
                        origin_location_id: from_location.clone(),
                        direction: direction.clone(),
                    })
                    .unwrap_or(serde_json::Value::Null),
                );
            }
            return (status, Json(body)).into_response();
        }

        (
            status,
            Json(Envelope::<()>::err(code, message, self.correlation_id)),
        )
            .into_response()
    }
}
