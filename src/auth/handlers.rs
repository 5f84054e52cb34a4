// HTTP handlers for account endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use validator::Validate;

use crate::auth::error::AuthError;
use crate::auth::models::{LoginRequest, RegisterRequest};
use crate::AppState;

/// Register a new user
/// POST /api/account/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let errors = state.auth.register(&request).await?;
    if errors.is_empty() {
        Ok(StatusCode::OK.into_response())
    } else {
        Ok((StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response())
    }
}

/// Login and receive a signed bearer token
/// POST /api/account/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    match state.auth.login(&request).await? {
        Some(response) => Ok(Json(response).into_response()),
        None => Ok(StatusCode::UNAUTHORIZED.into_response()),
    }
}
