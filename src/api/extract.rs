/// Request extractors shared by the API handlers
use crate::error::{AdminError, AdminResult};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AdminError::Validation(rejection.body_text()))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Parse a numeric path segment
pub fn parse_id(raw: &str, what: &str) -> AdminResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AdminError::Validation(format!("Invalid {}: {}", what, raw)))
}

/// Parse an optional numeric query filter, ignoring empty values
pub fn parse_optional_id(raw: Option<&str>, what: &str) -> AdminResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_id(value, what).map(Some),
        None => Ok(None),
    }
}

/// Treat empty query values as absent
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
