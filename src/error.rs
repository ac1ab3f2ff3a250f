use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::scoring::FieldError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input data ({} field errors)", .details.len())]
    BadRequest { details: Vec<FieldError> },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let body = match self {
            ApiError::BadRequest { details } => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                warn!(status = %status, ?fields, "validation failed");
                json!({ "error": "Invalid input data", "details": details })
            }
            ApiError::Unauthorized(message) => {
                warn!(status = %status, reason = %message, "request rejected");
                json!({ "error": message })
            }
            ApiError::Internal(message) => {
                error!(status = %status, error = %message, "api_error");
                json!({ "error": message, "success": false })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let (parts, body) = err.into_response().into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let err = ApiError::BadRequest {
            details: vec![FieldError {
                field: "age".into(),
                message: "Number must be greater than or equal to 18".into(),
            }],
        };
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid input data");
        assert_eq!(json["details"][0]["field"], "age");
    }

    #[tokio::test]
    async fn internal_errors_mark_failure() {
        let (status, json) = body_json(ApiError::Internal("boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "boom");
        assert_eq!(json["success"], false);
    }
}
