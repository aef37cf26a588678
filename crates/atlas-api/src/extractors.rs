//! Custom Axum extractors for correlation and player identity headers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use uuid::Uuid;

/// `x-correlation-id`, generated fresh when the caller doesn't supply one.
/// Every response echoes whichever value this resolves to.
pub struct CorrelationId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(CorrelationId(id))
    }
}

/// `x-player-guid`, parsed best-effort. A missing or malformed header is
/// not a rejection - the bootstrap handler treats `None` as "mint a fresh
/// guest", matching the reference stack's optional-extractor shape.
pub struct PlayerGuid(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for PlayerGuid
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-player-guid")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok());

        Ok(PlayerGuid(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn correlation_id_passes_through_an_existing_header() {
        let req = Request::builder()
            .header("x-correlation-id", "abc-123")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let CorrelationId(id) = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, "abc-123");
    }

    #[tokio::test]
    async fn correlation_id_generates_one_when_missing() {
        let req = Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        let CorrelationId(id) = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn player_guid_is_none_when_malformed() {
        let req = Request::builder()
            .header("x-player-guid", "not-a-uuid")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let PlayerGuid(id) = PlayerGuid::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(id.is_none());
    }
}
