//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use purchase::PurchaseError;

use crate::response::ApiResponse;
use crate::validation::ValidationErrors;

const INTERNAL_MESSAGE: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// One or more body fields failed validation.
    Validation(ValidationErrors),
    /// Domain logic error.
    Domain(DomainError),
    /// Purchase flow error.
    Purchase(PurchaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Purchase(err) => purchase_error_to_response(err),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

fn internal(err: &dyn std::error::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_MESSAGE.to_string(),
    )
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::ConcertNotFound(_) => (StatusCode::NOT_FOUND, "Concert not found".to_string()),
        _ => internal(&err),
    }
}

fn purchase_error_to_response(err: PurchaseError) -> (StatusCode, String) {
    match &err {
        PurchaseError::ConcertNotFound(_) => {
            (StatusCode::NOT_FOUND, "Concert not found".to_string())
        }
        PurchaseError::InsufficientInventory { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "tickets not enough to fulfil request".to_string(),
        ),
        PurchaseError::InvalidToken => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid payment token".to_string(),
        ),
        PurchaseError::InvalidQuantity | PurchaseError::InvalidOrder(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        _ => internal(&err),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        ApiError::Purchase(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
