use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use chrono::{DateTime, Utc};
use drop_core::AppError;
use uuid::Uuid;

/// State owned by a single request, created by the logger stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestValues {
    pub trace_id: Uuid,
    pub now: DateTime<Utc>,
    /// Set by the logger stage once the inner chain has produced a response.
    pub status: Option<StatusCode>,
}

impl RequestValues {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            now: Utc::now(),
            status: None,
        }
    }
}

impl Default for RequestValues {
    fn default() -> Self {
        Self::new()
    }
}

/// Handlers that need the values fail with a 500 when the logger stage did
/// not run for their route.
impl<S> FromRequestParts<S> for RequestValues
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestValues>()
            .cloned()
            .ok_or(AppError::ContextMissing("request values"))
    }
}
