use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use finance_query_core::YahooError;

use crate::service::finance::FinanceServiceError;
use crate::service::food::FoodScanError;

/// Error returned by route handlers, rendered as `{"error", "status"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Log an upstream failure and hide its details behind `message`.
    pub fn upstream(message: &str, err: FinanceServiceError) -> Self {
        match err {
            FinanceServiceError::NotFound(what) => {
                warn!("{}: no data for {}", message, what);
                ApiError::NotFound(format!("No data found for {what}"))
            }
            FinanceServiceError::Yahoo(YahooError::NotFound(what)) => {
                warn!("{}: provider has no {}", message, what);
                ApiError::NotFound(message.to_string())
            }
            FinanceServiceError::InvalidInput(detail) => ApiError::BadRequest(detail),
            other => {
                error!("{}: {}", message, other);
                ApiError::Internal(message.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        }
    }
}

impl From<FoodScanError> for ApiError {
    fn from(err: FoodScanError) -> Self {
        match err {
            FoodScanError::InvalidImage(detail) => {
                warn!("Rejected food image: {}", detail);
                ApiError::BadRequest("Invalid image data provided.".into())
            }
            FoodScanError::NoNutrients(label) => {
                ApiError::NotFound(format!("No nutrient information for {label}"))
            }
            other => {
                error!("Food scan failed: {}", other);
                ApiError::Internal("Failed to get nutrient information".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({
            "error": self.message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
