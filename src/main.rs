pub mod auth;
pub mod countries;
pub mod db;
pub mod error;
pub mod hotels;
pub mod models;
pub mod repository;

use std::sync::Arc;

use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::manager::AuthManager;
use auth::store::PgCredentialStore;
use auth::token::{JwtSettings, TokenService};
use countries::CountriesRepository;
use hotels::HotelsRepository;
use models::{Country, CountryDetails, CreateCountry, CreateHotel, Hotel, UpdateCountry, UpdateHotel};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        countries::handlers::get_countries,
        countries::handlers::get_country,
        countries::handlers::create_country,
        countries::handlers::update_country,
        countries::handlers::delete_country,
        hotels::handlers::get_hotels,
        hotels::handlers::get_hotel,
        hotels::handlers::create_hotel,
        hotels::handlers::update_hotel,
        hotels::handlers::delete_hotel,
    ),
    components(
        schemas(
            Country,
            CountryDetails,
            CreateCountry,
            UpdateCountry,
            Hotel,
            CreateHotel,
            UpdateHotel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "countries", description = "Country management endpoints"),
        (name = "hotels", description = "Hotel management endpoints")
    ),
    info(
        title = "Hotel Listing API",
        version = "1.0.0",
        description = "RESTful API for managing countries and their hotels"
    )
)]
struct ApiDoc;

/// Registers the bearer-token security scheme referenced by the
/// protected endpoints
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<AuthManager<PgCredentialStore>>,
    pub countries: CountriesRepository,
    pub hotels: HotelsRepository,
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(db: PgPool, jwt_settings: JwtSettings) -> axum::Router {
    use axum::routing::{delete, get, post, put};
    use tower_http::cors::{Any, CorsLayer};

    let auth = AuthManager::new(
        PgCredentialStore::new(db.clone()),
        TokenService::new(jwt_settings),
    );
    let state = AppState {
        countries: CountriesRepository::new(db.clone()),
        hotels: HotelsRepository::new(db.clone()),
        auth: Arc::new(auth),
        db,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        // Swagger UI
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        // Account routes
        .route("/api/account/register", post(auth::handlers::register_handler))
        .route("/api/account/login", post(auth::handlers::login_handler))
        // Country routes
        .route("/api/countries", get(countries::handlers::get_countries))
        .route("/api/countries", post(countries::handlers::create_country))
        .route("/api/countries/:id", get(countries::handlers::get_country))
        .route("/api/countries/:id", put(countries::handlers::update_country))
        .route("/api/countries/:id", delete(countries::handlers::delete_country))
        // Hotel routes
        .route("/api/hotels", get(hotels::handlers::get_hotels))
        .route("/api/hotels", post(hotels::handlers::create_hotel))
        .route("/api/hotels/:id", get(hotels::handlers::get_hotel))
        .route("/api/hotels/:id", put(hotels::handlers::update_hotel))
        .route("/api/hotels/:id", delete(hotels::handlers::delete_hotel))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Hotel Listing API - Starting...");

    // Get configuration from environment variables
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    let jwt_settings = JwtSettings::from_env().expect("JWT settings must be set in environment");

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let app = create_router(db_pool, jwt_settings);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Hotel Listing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
