// HTTP handlers for country endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::middleware::{Administrator, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{Country, CountryDetails, CreateCountry, UpdateCountry};
use crate::repository::RepositoryError;
use crate::AppState;

/// Handler for GET /api/countries
/// Retrieves all countries without their hotels
#[utoipa::path(
    get,
    path = "/api/countries",
    responses(
        (status = 200, description = "List of all countries", body = Vec<Country>),
        (status = 500, description = "Internal server error", body = String, example = json!({"error_code": "DATABASE_ERROR"}))
    ),
    tag = "countries"
)]
pub async fn get_countries(State(state): State<AppState>) -> Result<Json<Vec<Country>>, ApiError> {
    tracing::debug!("Fetching all countries");

    let countries = state.countries.get_all().await?;
    Ok(Json(countries))
}

/// Handler for GET /api/countries/:id
/// Retrieves a country together with its hotels
#[utoipa::path(
    get,
    path = "/api/countries/{id}",
    params(
        ("id" = i32, Path, description = "Country ID")
    ),
    responses(
        (status = 200, description = "Country found", body = CountryDetails),
        (status = 404, description = "Country not found", body = String, example = json!({"error_code": "NOT_FOUND"})),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "countries"
)]
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CountryDetails>, ApiError> {
    tracing::debug!("Fetching country with id: {}", id);

    let details = state
        .countries
        .get_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Country", id))?;

    Ok(Json(details))
}

/// Handler for POST /api/countries
/// Creates a new country (authenticated users only)
#[utoipa::path(
    post,
    path = "/api/countries",
    request_body = CreateCountry,
    responses(
        (status = 201, description = "Country created successfully", body = Country),
        (status = 400, description = "Invalid input data", body = String),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "countries"
)]
pub async fn create_country(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateCountry>,
) -> Result<(StatusCode, Json<Country>), ApiError> {
    tracing::debug!("Creating new country: {}", payload.name);

    payload.validate()?;

    let country = Country {
        id: 0,
        name: payload.name,
        short_name: payload.short_name,
        row_version: 0,
    };
    let created = state.countries.add(&country).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for PUT /api/countries/:id
/// Updates an existing country (authenticated users only)
///
/// Update is fetch-then-save against the loaded row_version. A losing
/// concurrent writer is told 409 when the row still exists and 404 when
/// the other writer deleted it.
#[utoipa::path(
    put,
    path = "/api/countries/{id}",
    params(
        ("id" = i32, Path, description = "Country ID")
    ),
    request_body = UpdateCountry,
    responses(
        (status = 200, description = "Country updated successfully", body = Country),
        (status = 400, description = "Invalid input data or id mismatch", body = String),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 404, description = "Country not found", body = String),
        (status = 409, description = "Country was changed by another user", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "countries"
)]
pub async fn update_country(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCountry>,
) -> Result<Json<Country>, ApiError> {
    tracing::debug!("Updating country with id: {}", id);

    payload.validate()?;
    if payload.id != id {
        return Err(ApiError::BadRequest {
            message: format!(
                "Body id {} does not match route id {}",
                payload.id, id
            ),
        });
    }

    let mut country = state
        .countries
        .get(Some(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Country", id))?;
    country.name = payload.name;
    country.short_name = payload.short_name;

    match state.countries.update(&country).await {
        Ok(updated) => Ok(Json(updated)),
        Err(RepositoryError::ConcurrencyConflict) => {
            // Conflict only if the row is still there; a concurrent
            // delete reads as not-found
            if state.countries.exists(id).await? {
                Err(RepositoryError::ConcurrencyConflict.into())
            } else {
                Err(ApiError::not_found("Country", id))
            }
        }
        Err(error) => Err(error.into()),
    }
}

/// Handler for DELETE /api/countries/:id
/// Deletes a country (administrators only)
#[utoipa::path(
    delete,
    path = "/api/countries/{id}",
    params(
        ("id" = i32, Path, description = "Country ID")
    ),
    responses(
        (status = 204, description = "Country deleted successfully"),
        (status = 401, description = "Missing or invalid token", body = String),
        (status = 403, description = "Administrator role required", body = String),
        (status = 404, description = "Country not found", body = String),
        (status = 409, description = "Country still has hotels", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "countries"
)]
pub async fn delete_country(
    State(state): State<AppState>,
    _admin: Administrator,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting country with id: {}", id);

    match state.countries.delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => Err(ApiError::not_found("Country", id)),
        Err(error) => Err(error.into()),
    }
}
