// HTTP handlers for hotel endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::middleware::{Administrator, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{CreateHotel, Hotel, UpdateHotel};
use crate::repository::RepositoryError;
use crate::AppState;

/// Handler for GET /api/hotels
/// Retrieves all hotels
#[utoipa::path(
    get,
    path = "/api/hotels",
    responses(
        (status = 200, description = "List of all hotels", body = Vec<Hotel>),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "hotels"
)]
pub async fn get_hotels(State(state): State<AppState>) -> Result<Json<Vec<Hotel>>, ApiError> {
    tracing::debug!("Fetching all hotels");

    let hotels = state.hotels.get_all().await?;
    Ok(Json(hotels))
}

/// Handler for GET /api/hotels/:id
/// Retrieves a specific hotel by ID
#[utoipa::path(
    get,
    path = "/api/hotels/{id}",
    params(
        ("id" = i32, Path, description = "Hotel ID")
    ),
    responses(
        (status = 200, description = "Hotel found", body = Hotel),
        (status = 404, description = "Hotel not found", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "hotels"
)]
pub async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Hotel>, ApiError> {
    tracing::debug!("Fetching hotel with id: {}", id);

    let hotel = state
        .hotels
        .get(Some(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Hotel", id))?;

    Ok(Json(hotel))
}

/// Handler for POST /api/hotels
/// Creates a new hotel (authenticated users only)
///
/// The country reference is checked by the store's foreign key; a
/// missing country surfaces as a conflict, not a validation error.
#[utoipa::path(
    post,
    path = "/api/hotels",
    request_body = CreateHotel,
    responses(
        (status = 201, description = "Hotel created successfully", body = Hotel),
        (status = 400, description = "Invalid input data", body = String),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 409, description = "Referenced country does not exist", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "hotels"
)]
pub async fn create_hotel(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateHotel>,
) -> Result<(StatusCode, Json<Hotel>), ApiError> {
    tracing::debug!("Creating new hotel: {}", payload.name);

    payload.validate()?;

    let hotel = Hotel {
        id: 0,
        name: payload.name,
        address: payload.address,
        rating: payload.rating,
        country_id: payload.country_id,
        row_version: 0,
    };
    let created = state.hotels.add(&hotel).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for PUT /api/hotels/:id
/// Updates an existing hotel (authenticated users only)
#[utoipa::path(
    put,
    path = "/api/hotels/{id}",
    params(
        ("id" = i32, Path, description = "Hotel ID")
    ),
    request_body = UpdateHotel,
    responses(
        (status = 200, description = "Hotel updated successfully", body = Hotel),
        (status = 400, description = "Invalid input data or id mismatch", body = String),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 404, description = "Hotel not found", body = String),
        (status = 409, description = "Hotel was changed by another user", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "hotels"
)]
pub async fn update_hotel(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateHotel>,
) -> Result<Json<Hotel>, ApiError> {
    tracing::debug!("Updating hotel with id: {}", id);

    payload.validate()?;
    if payload.id != id {
        return Err(ApiError::BadRequest {
            message: format!(
                "Body id {} does not match route id {}",
                payload.id, id
            ),
        });
    }

    let mut hotel = state
        .hotels
        .get(Some(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Hotel", id))?;
    hotel.name = payload.name;
    hotel.address = payload.address;
    hotel.rating = payload.rating;
    hotel.country_id = payload.country_id;

    match state.hotels.update(&hotel).await {
        Ok(updated) => Ok(Json(updated)),
        Err(RepositoryError::ConcurrencyConflict) => {
            if state.hotels.exists(id).await? {
                Err(RepositoryError::ConcurrencyConflict.into())
            } else {
                Err(ApiError::not_found("Hotel", id))
            }
        }
        Err(error) => Err(error.into()),
    }
}

/// Handler for DELETE /api/hotels/:id
/// Deletes a hotel (administrators only)
#[utoipa::path(
    delete,
    path = "/api/hotels/{id}",
    params(
        ("id" = i32, Path, description = "Hotel ID")
    ),
    responses(
        (status = 204, description = "Hotel deleted successfully"),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 403, description = "Administrator role required", body = String),
        (status = 404, description = "Hotel not found", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "hotels"
)]
pub async fn delete_hotel(
    State(state): State<AppState>,
    _admin: Administrator,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting hotel with id: {}", id);

    match state.hotels.delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => Err(ApiError::not_found("Hotel", id)),
        Err(error) => Err(error.into()),
    }
}
