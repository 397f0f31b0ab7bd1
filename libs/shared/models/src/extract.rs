use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, ValidationError};

/// `Json<T>` whose rejections come back as field-level validation errors
/// instead of axum's plain-text responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, message) = match &rejection {
            JsonRejection::JsonDataError(err) => split_field(&err.body_text()),
            JsonRejection::JsonSyntaxError(_) => {
                ("body".to_string(), "Request body is not valid JSON".to_string())
            }
            JsonRejection::MissingJsonContentType(_) => (
                "body".to_string(),
                "Expected request with `Content-Type: application/json`".to_string(),
            ),
            _ => ("body".to_string(), rejection.body_text()),
        };

        AppError::Validation(ValidationError::new(field, message))
    }
}

// Data errors read "<prefix>: <path>: <reason>" when serde knows the path.
fn split_field(text: &str) -> (String, String) {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, rest)| rest);

    match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (path.to_string(), reason.to_string())
        }
        _ => ("body".to_string(), detail.to_string()),
    }
}
