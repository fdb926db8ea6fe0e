use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::IntoParams;
use uuid::Uuid;

/// Header identifying the operator on whose behalf a mutation runs.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size; falls back to the configured default when omitted
    pub per_page: Option<u64>,
}

fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
        }
    }
}

impl PaginationParams {
    /// Normalizes the raw query values against the configured page-size
    /// default and cap.
    pub fn clamp(&self, default_per_page: u64, max_per_page: u64) -> (u64, u64) {
        (
            self.page.max(1),
            self.per_page
                .unwrap_or(default_per_page)
                .clamp(1, max_per_page),
        )
    }
}

/// Operator identity for audit attribution, taken from the `X-Actor-Id`
/// header. Requests without a parseable header run as the nil actor; the
/// gateway in front of this service is what vouches for the value.
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .unwrap_or_else(Uuid::nil);
        Ok(ActorId(actor))
    }
}
