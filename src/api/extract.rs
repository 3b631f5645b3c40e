use crate::error::{AppError, Result};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// `{song_id}` path segment. Non-numeric ids are rejected with the JSON
/// error envelope rather than axum's plain-text rejection.
pub struct SongId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for SongId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        raw.parse::<i32>()
            .map(SongId)
            .map_err(|_| AppError::Validation(format!("invalid song_id: {}", raw)))
    }
}

/// JSON request body that rejects with the JSON error envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("failed to decode body: {}", e.body_text())))?;

        Ok(JsonBody(value))
    }
}
