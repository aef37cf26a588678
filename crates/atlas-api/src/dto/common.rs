//! The canonical response envelope (§6, DESIGN.md Open Question 2): every
//! handler returns `{success, data | error, correlationId}`, never a bare
//! payload.

use serde::Serialize;
use utoipa::ToSchema;

/// The error half of an [`Envelope`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
}

/// `{success, data | error, correlationId}`. `data` and `error` are
/// mutually exclusive by construction - use [`Envelope::ok`] or
/// [`Envelope::err`], never the struct literal directly.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
    pub correlation_id: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, correlation_id: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(EnvelopeError {
                code: code.into(),
                message: message.into(),
            }),
            correlation_id: correlation_id.into(),
        }
    }
}
