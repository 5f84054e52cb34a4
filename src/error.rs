// Error handling for the resource endpoints
// Centralizes HTTP response conversion; repository outcomes are mapped
// here so handlers stay thin

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::repository::RepositoryError;

/// Main error type for the resource handlers
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failures (HTTP 400)
    ValidationError(validator::ValidationErrors),

    /// Malformed request outside field validation, e.g. a body id that
    /// contradicts the route id (HTTP 400)
    BadRequest { message: String },

    /// Resource not found by id (HTTP 404)
    NotFound { resource: String, id: String },

    /// Conflicting state: concurrent modification or a store constraint
    /// such as a foreign-key reference (HTTP 409)
    Conflict { message: String },

    /// Store faults; details are logged, never sent to clients (HTTP 500)
    DatabaseError(sqlx::Error),
}

/// Consistent error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. "NOT_FOUND"
    pub error_code: String,
    /// Human-readable message
    pub message: String,
    /// Field-level details when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: i32) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error_code: "VALIDATION_ERROR".to_string(),
                        message: "Request validation failed".to_string(),
                        details: Some(
                            serde_json::to_value(errors).unwrap_or(serde_json::json!({})),
                        ),
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::BadRequest { message } => {
                debug!("Bad request: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error_code: "BAD_REQUEST".to_string(),
                        message: message.clone(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error_code: "NOT_FOUND".to_string(),
                        message: format!("{} with id {} not found", resource, id),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error_code: "CONFLICT".to_string(),
                        message: message.clone(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: "DATABASE_ERROR".to_string(),
                        message: "A database error occurred".to_string(),
                        details: None,
                        timestamp: Utc::now().to_rfc3339(),
                    },
                )
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Map repository outcomes to HTTP shapes; constraint violations are the
/// store's verdict and are surfaced as conflicts, unchanged in meaning
impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ApiError::NotFound {
                resource: "Record".to_string(),
                id: "requested".to_string(),
            },
            RepositoryError::ConcurrencyConflict => ApiError::Conflict {
                message: "The record was changed by another user; reload it and retry"
                    .to_string(),
            },
            RepositoryError::Database(db_error) => {
                if let sqlx::Error::Database(inner) = &db_error {
                    if inner.is_foreign_key_violation() {
                        return ApiError::Conflict {
                            message: "The record is referenced by other records".to_string(),
                        };
                    }
                    if inner.is_unique_violation() {
                        return ApiError::Conflict {
                            message: "A record with the same unique value already exists"
                                .to_string(),
                        };
                    }
                }
                ApiError::DatabaseError(db_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        let api_error: ApiError = RepositoryError::ConcurrencyConflict.into();
        let (status, body) = api_error.to_error_response();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error_code, "CONFLICT");
    }

    #[test]
    fn test_not_found_maps_to_404_with_context() {
        let (status, body) = ApiError::not_found("Country", 5).to_error_response();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Country with id 5 not found");
    }

    #[test]
    fn test_row_not_found_repo_error_maps_to_404() {
        let api_error: ApiError = RepositoryError::NotFound.into();
        let (status, _) = api_error.to_error_response();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_plain_database_error_maps_to_500() {
        let api_error: ApiError = RepositoryError::Database(sqlx::Error::PoolClosed).into();
        let (status, body) = api_error.to_error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // No internals leak into the client message
        assert_eq!(body.message, "A database error occurred");
    }
}
